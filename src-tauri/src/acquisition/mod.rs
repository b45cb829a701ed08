//! Getting an image into the pipeline: an uploaded file or a camera frame.

pub mod camera;
pub mod upload;

pub use upload::{AcquireError, ImageSource};
