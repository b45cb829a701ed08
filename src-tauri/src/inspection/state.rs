use serde::{Deserialize, Serialize};

/// Where the single in-flight attempt is. Anything but `Idle` blocks new
/// submissions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PipelineStatus {
    #[default]
    Idle,
    Encoding,
    Inspecting,
}

impl PipelineStatus {
    pub fn is_busy(&self) -> bool {
        *self != PipelineStatus::Idle
    }
}
