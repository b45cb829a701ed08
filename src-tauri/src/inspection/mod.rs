pub(crate) mod commands;
pub mod controller;
pub mod history;
pub mod state;

pub use controller::{AttemptOutcome, BusyGuard, InspectionController, PipelineBusy};
pub use history::InspectionLog;
pub use state::PipelineStatus;
