use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    bridge::CameraBridge,
    encode::{encode_frame, CameraFrame, FrameError},
    CameraStatus, FacingMode,
};
use crate::{
    events::{self, EventSink},
    models::EncodedImage,
    notice::Notice,
};

const ENABLE_LOGS: bool = true;
use crate::{log_debug, log_info, log_warn};

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("camera is not streaming")]
    NotStreaming,
    #[error("camera access was denied: {0}")]
    PermissionDenied(String),
    #[error("could not encode the captured frame: {0}")]
    Frame(#[from] FrameError),
    #[error("frame encoder task failed: {0}")]
    Task(String),
}

/// Ownership of one requested media stream. Dropping the lease releases the
/// stream, so every way out of a camera state gives the tracks back once.
pub struct StreamLease {
    stream_id: String,
    bridge: Arc<dyn CameraBridge>,
}

impl StreamLease {
    fn request(bridge: Arc<dyn CameraBridge>, facing: FacingMode) -> Self {
        let stream_id = Uuid::new_v4().to_string();
        bridge.request_stream(&stream_id, facing);
        Self { stream_id, bridge }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        log_debug!("releasing camera stream {}", self.stream_id);
        self.bridge.release_stream(&self.stream_id);
    }
}

enum CameraSession {
    Closed,
    Requesting { facing: FacingMode, lease: StreamLease },
    Streaming { facing: FacingMode, lease: StreamLease },
    Denied { facing: FacingMode, reason: String },
}

impl CameraSession {
    fn status(&self) -> CameraStatus {
        match self {
            CameraSession::Closed => CameraStatus::Closed,
            CameraSession::Requesting { facing, lease } => CameraStatus::RequestingPermission {
                facing: *facing,
                stream_id: lease.stream_id().to_string(),
            },
            CameraSession::Streaming { facing, lease } => CameraStatus::Streaming {
                facing: *facing,
                stream_id: lease.stream_id().to_string(),
            },
            CameraSession::Denied { facing, reason } => CameraStatus::PermissionDenied {
                facing: *facing,
                reason: reason.clone(),
            },
        }
    }

    fn stream_id(&self) -> Option<&str> {
        match self {
            CameraSession::Requesting { lease, .. } | CameraSession::Streaming { lease, .. } => {
                Some(lease.stream_id())
            }
            CameraSession::Closed | CameraSession::Denied { .. } => None,
        }
    }
}

/// The camera dialog's state machine. At most one stream is held at a time.
#[derive(Clone)]
pub struct CameraController {
    session: Arc<Mutex<CameraSession>>,
    bridge: Arc<dyn CameraBridge>,
    sink: Arc<dyn EventSink>,
}

impl CameraController {
    pub fn new(bridge: Arc<dyn CameraBridge>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            session: Arc::new(Mutex::new(CameraSession::Closed)),
            bridge,
            sink,
        }
    }

    pub async fn status(&self) -> CameraStatus {
        self.session.lock().await.status()
    }

    /// Requests a new stream, releasing whatever was held before.
    pub async fn open(&self, facing: FacingMode) -> CameraStatus {
        let mut session = self.session.lock().await;
        *session = CameraSession::Closed;
        let lease = StreamLease::request(self.bridge.clone(), facing);
        log_info!("camera stream {} requested facing={:?}", lease.stream_id(), facing);
        *session = CameraSession::Requesting { facing, lease };
        self.publish(&session)
    }

    pub async fn stream_granted(&self, stream_id: &str) -> CameraStatus {
        let mut session = self.session.lock().await;
        let current = std::mem::replace(&mut *session, CameraSession::Closed);
        *session = match current {
            CameraSession::Requesting { facing, lease } if lease.stream_id() == stream_id => {
                log_info!("camera stream {} granted", stream_id);
                CameraSession::Streaming { facing, lease }
            }
            other => {
                if other.stream_id() != Some(stream_id) {
                    log_warn!("stale grant for camera stream {}; releasing it", stream_id);
                    self.bridge.release_stream(stream_id);
                }
                other
            }
        };
        self.publish(&session)
    }

    pub async fn stream_denied(&self, stream_id: &str, reason: String) -> CameraStatus {
        let mut session = self.session.lock().await;
        let current = std::mem::replace(&mut *session, CameraSession::Closed);
        *session = match current {
            CameraSession::Requesting { facing, lease } if lease.stream_id() == stream_id => {
                log_warn!("camera stream {} denied: {}", stream_id, reason);
                drop(lease);
                Notice::camera_denied().emit(self.sink.as_ref());
                CameraSession::Denied { facing, reason }
            }
            other => {
                log_debug!("ignoring denial for stale camera stream {}", stream_id);
                other
            }
        };
        self.publish(&session)
    }

    /// Swaps front and rear cameras. The old stream is released before the
    /// new one is requested.
    pub async fn toggle_facing(&self) -> Result<CameraStatus, CameraError> {
        let mut session = self.session.lock().await;
        let facing = match &*session {
            CameraSession::Streaming { facing, .. } | CameraSession::Requesting { facing, .. } => {
                facing.toggled()
            }
            CameraSession::Denied { reason, .. } => {
                return Err(CameraError::PermissionDenied(reason.clone()))
            }
            CameraSession::Closed => return Err(CameraError::NotStreaming),
        };

        *session = CameraSession::Closed;
        let lease = StreamLease::request(self.bridge.clone(), facing);
        log_info!("camera stream {} requested facing={:?}", lease.stream_id(), facing);
        *session = CameraSession::Requesting { facing, lease };
        Ok(self.publish(&session))
    }

    /// Encodes `frame` and closes the camera. On an encoding failure the stream
    /// stays open so the user can try again.
    pub async fn capture(&self, frame: CameraFrame) -> Result<EncodedImage, CameraError> {
        self.capture_with(move || encode_frame(frame)).await
    }

    async fn capture_with<F>(&self, encode: F) -> Result<EncodedImage, CameraError>
    where
        F: FnOnce() -> Result<EncodedImage, FrameError> + Send + 'static,
    {
        let mut session = self.session.lock().await;
        match &*session {
            CameraSession::Streaming { .. } => {}
            CameraSession::Denied { reason, .. } => {
                return Err(CameraError::PermissionDenied(reason.clone()))
            }
            CameraSession::Closed | CameraSession::Requesting { .. } => {
                return Err(CameraError::NotStreaming)
            }
        }

        let encoded = match tokio::task::spawn_blocking(encode).await {
            Ok(encoded) => encoded.map_err(CameraError::from),
            Err(err) => Err(CameraError::Task(err.to_string())),
        };

        let image = match encoded {
            Ok(image) => image,
            Err(err) => {
                log_warn!("camera frame rejected: {}", err);
                Notice::capture_failed().emit(self.sink.as_ref());
                return Err(err);
            }
        };

        log_info!("captured camera frame ({} bytes jpeg)", image.len());
        *session = CameraSession::Closed;
        self.publish(&session);
        Ok(image)
    }

    pub async fn close(&self) -> CameraStatus {
        let mut session = self.session.lock().await;
        *session = CameraSession::Closed;
        self.publish(&session)
    }

    fn publish(&self, session: &CameraSession) -> CameraStatus {
        let status = session.status();
        events::emit(self.sink.as_ref(), events::CAMERA_STATE_CHANGED, &status);
        status
    }
}
