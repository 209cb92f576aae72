//! Filter element descriptors
//!
//! Filters sit between endpoints in the remote pipeline and transform
//! the media flowing through them. Each descriptor names the remote
//! filter type and the parameters its constructor takes.

use super::ElementDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Generic filter wrapping an arbitrary GStreamer element chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GStreamerFilter {
    /// GStreamer launch fragment instantiated inside the pipeline
    pub command: String,
}

impl GStreamerFilter {
    /// Create a filter from a raw GStreamer launch fragment
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Horizontal mirror preset
    pub fn mirror() -> Self {
        Self::new("videoflip method=4")
    }
}

impl ElementDescriptor for GStreamerFilter {
    fn type_name(&self) -> &'static str {
        "GStreamerFilter"
    }

    fn constructor_params(&self) -> Value {
        json!({ "command": self.command })
    }
}

/// Bar/QR-code detector; emits [`CodeFound`](super::events::CodeFound)
/// for every code recognized in the video stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZBarFilter;

impl ZBarFilter {
    /// Event type name the filter emits
    pub const CODE_FOUND: &'static str = "CodeFound";
}

impl ElementDescriptor for ZBarFilter {
    fn type_name(&self) -> &'static str {
        "ZBarFilter"
    }
}

/// Overlays an image on every detected face
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaceOverlayFilter {
    /// URI of the overlay image
    pub image_uri: String,
    /// Horizontal offset relative to the face width
    pub offset_x_percent: f64,
    /// Vertical offset relative to the face height
    pub offset_y_percent: f64,
    /// Overlay width relative to the face width
    pub width_percent: f64,
    /// Overlay height relative to the face height
    pub height_percent: f64,
}

impl FaceOverlayFilter {
    /// Overlay `image_uri` exactly on the detected face region
    pub fn new(image_uri: impl Into<String>) -> Self {
        Self {
            image_uri: image_uri.into(),
            offset_x_percent: 0.0,
            offset_y_percent: 0.0,
            width_percent: 1.0,
            height_percent: 1.0,
        }
    }

    /// Set the overlay offsets and size relative to the face region
    pub fn with_region(mut self, offset_x: f64, offset_y: f64, width: f64, height: f64) -> Self {
        self.offset_x_percent = offset_x;
        self.offset_y_percent = offset_y;
        self.width_percent = width;
        self.height_percent = height;
        self
    }
}

impl ElementDescriptor for FaceOverlayFilter {
    fn type_name(&self) -> &'static str {
        "FaceOverlayFilter"
    }

    fn constructor_params(&self) -> Value {
        json!({
            "imageUri": self.image_uri,
            "offsetXPercent": self.offset_x_percent,
            "offsetYPercent": self.offset_y_percent,
            "widthPercent": self.width_percent,
            "heightPercent": self.height_percent,
        })
    }
}

/// License-plate detector; emits
/// [`PlateDetected`](super::events::PlateDetected) per recognized plate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlateDetectorFilter {
    /// Expected plate width as a fraction of the frame width
    pub plate_width_percentage: f64,
}

impl PlateDetectorFilter {
    /// Event type name the filter emits
    pub const PLATE_DETECTED: &'static str = "PlateDetected";

    /// Create a detector tuned to the expected plate width fraction
    pub fn new(plate_width_percentage: f64) -> Self {
        Self {
            plate_width_percentage,
        }
    }
}

impl ElementDescriptor for PlateDetectorFilter {
    fn type_name(&self) -> &'static str {
        "PlateDetectorFilter"
    }

    fn constructor_params(&self) -> Value {
        json!({ "plateWidthPercentage": self.plate_width_percentage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gstreamer_filter_params() {
        let filter = GStreamerFilter::new("videobalance saturation=0.0");
        assert_eq!(filter.type_name(), "GStreamerFilter");
        assert_eq!(
            filter.constructor_params(),
            json!({ "command": "videobalance saturation=0.0" })
        );
    }

    #[test]
    fn test_mirror_preset() {
        assert_eq!(GStreamerFilter::mirror().command, "videoflip method=4");
    }

    #[test]
    fn test_zbar_filter_has_no_params() {
        assert_eq!(ZBarFilter.type_name(), "ZBarFilter");
        assert_eq!(ZBarFilter.constructor_params(), json!({}));
    }

    #[test]
    fn test_face_overlay_region() {
        let filter = FaceOverlayFilter::new("http://img.example.com/hat.png")
            .with_region(-0.35, -1.2, 1.6, 1.6);
        let params = filter.constructor_params();
        assert_eq!(params["imageUri"], "http://img.example.com/hat.png");
        assert_eq!(params["offsetYPercent"], json!(-1.2));
        assert_eq!(params["widthPercent"], json!(1.6));
    }

    #[test]
    fn test_plate_detector_params() {
        let filter = PlateDetectorFilter::new(0.3);
        assert_eq!(
            filter.constructor_params(),
            json!({ "plateWidthPercentage": 0.3 })
        );
    }
}
