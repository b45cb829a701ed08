use serde::{Deserialize, Serialize};

use crate::events::{self, EventSink};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    InvalidFileType,
    FileError,
    InspectionFailed,
    CameraDenied,
    CaptureFailed,
    ProfileSaved,
    SettingsSaved,
    SaveFailed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// A user-visible toast. Never fatal; the frontend decides how long it stays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub kind: NoticeKind,
    pub variant: NoticeVariant,
    pub title: String,
    pub description: String,
    /// Stays on screen until the user dismisses the dialog that raised it.
    pub persistent: bool,
}

impl Notice {
    fn destructive(kind: NoticeKind, title: &str, description: &str) -> Self {
        Self {
            kind,
            variant: NoticeVariant::Destructive,
            title: title.into(),
            description: description.into(),
            persistent: false,
        }
    }

    fn info(kind: NoticeKind, title: &str, description: &str) -> Self {
        Self {
            kind,
            variant: NoticeVariant::Default,
            title: title.into(),
            description: description.into(),
            persistent: false,
        }
    }

    pub fn invalid_file_type() -> Self {
        Self::destructive(
            NoticeKind::InvalidFileType,
            "Invalid File Type",
            "Please upload a valid image file (e.g., PNG, JPG).",
        )
    }

    pub fn file_error() -> Self {
        Self::destructive(
            NoticeKind::FileError,
            "File Error",
            "Could not read the uploaded file.",
        )
    }

    pub fn inspection_failed() -> Self {
        Self::destructive(
            NoticeKind::InspectionFailed,
            "Inspection Failed",
            "There was an error processing the image. Please try again.",
        )
    }

    pub fn camera_denied() -> Self {
        Self {
            persistent: true,
            ..Self::destructive(
                NoticeKind::CameraDenied,
                "Camera Access Denied",
                "Please enable camera permissions in your system settings to use this feature.",
            )
        }
    }

    pub fn capture_failed() -> Self {
        Self::destructive(
            NoticeKind::CaptureFailed,
            "Capture Failed",
            "Could not capture a frame from the camera. Please try again.",
        )
    }

    pub fn profile_saved() -> Self {
        Self::info(
            NoticeKind::ProfileSaved,
            "Profile Updated",
            "Your changes have been saved successfully.",
        )
    }

    pub fn settings_saved() -> Self {
        Self::info(
            NoticeKind::SettingsSaved,
            "Settings Saved",
            "Your preferences will apply to the next inspection.",
        )
    }

    /// `subject` names what was being saved, e.g. `"profile"` or `"settings"`.
    pub fn save_failed(subject: &str) -> Self {
        Self::destructive(
            NoticeKind::SaveFailed,
            "Save Failed",
            &format!("There was an error saving your {subject}. Please try again."),
        )
    }

    pub fn emit(&self, sink: &dyn EventSink) {
        events::emit(sink, events::NOTICE, self);
    }
}
