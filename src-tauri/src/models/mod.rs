pub mod image;
pub mod inspection;

pub use image::{DataUriError, EncodedImage};
pub use inspection::{
    BoundingBox, Confidence, Finding, InspectionOutcome, InspectionRecord, Verdict,
};
