use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FacingMode {
    #[default]
    Environment,
    User,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }
}

/// What the capture dialog should render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CameraStatus {
    Closed,
    RequestingPermission {
        facing: FacingMode,
        #[serde(rename = "streamId")]
        stream_id: String,
    },
    Streaming {
        facing: FacingMode,
        #[serde(rename = "streamId")]
        stream_id: String,
    },
    PermissionDenied {
        facing: FacingMode,
        reason: String,
    },
}

impl CameraStatus {
    pub fn can_capture(&self) -> bool {
        matches!(self, CameraStatus::Streaming { .. })
    }
}
