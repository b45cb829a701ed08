//! Live camera capture. The webview owns the media tracks; this module owns
//! the dialog's state machine and decides when tracks are requested and
//! released.

pub mod bridge;
pub(crate) mod commands;
pub mod controller;
pub mod encode;
pub mod state;

pub use bridge::{CameraBridge, WebviewCameraBridge};
pub use controller::{CameraController, CameraError, StreamLease};
pub use encode::{encode_frame, CameraFrame, FrameError};
pub use state::{CameraStatus, FacingMode};
