use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;

use super::{InspectionLog, PipelineStatus};
use crate::{
    acquisition::ImageSource,
    events::{self, EventSink},
    inference::InspectionStrategy,
    models::{EncodedImage, InspectionRecord},
    notice::Notice,
    view::ResultView,
};

const ENABLE_LOGS: bool = true;
use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("an inspection is already in progress")]
pub struct PipelineBusy;

/// How an accepted attempt ended: exactly one of a new record or a notice.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum AttemptOutcome {
    Recorded { record: InspectionRecord },
    Rejected { notice: Notice },
}

/// Holds the pipeline busy for its lifetime and puts it back to `Idle` on
/// drop, however the attempt ends.
pub struct BusyGuard {
    status: Arc<Mutex<PipelineStatus>>,
    sink: Arc<dyn EventSink>,
}

impl BusyGuard {
    fn advance(&self, next: PipelineStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = next;
        events::emit(self.sink.as_ref(), events::INSPECTION_STATUS_CHANGED, &next);
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.advance(PipelineStatus::Idle);
    }
}

#[derive(Clone)]
pub struct InspectionController {
    status: Arc<Mutex<PipelineStatus>>,
    strategy: Arc<RwLock<Arc<dyn InspectionStrategy>>>,
    log: Arc<InspectionLog>,
    sink: Arc<dyn EventSink>,
}

impl InspectionController {
    pub fn new(strategy: Arc<dyn InspectionStrategy>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            status: Arc::new(Mutex::new(PipelineStatus::Idle)),
            strategy: Arc::new(RwLock::new(strategy)),
            log: Arc::new(InspectionLog::new()),
            sink,
        }
    }

    pub fn status(&self) -> PipelineStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.status().is_busy()
    }

    pub fn log(&self) -> &InspectionLog {
        &self.log
    }

    /// Takes effect for the next attempt; one already running keeps the
    /// strategy it started with.
    pub fn set_strategy(&self, strategy: Arc<dyn InspectionStrategy>) {
        log_info!("inspection strategy switched to {:?}", strategy.kind());
        *self.strategy.write().unwrap_or_else(PoisonError::into_inner) = strategy;
    }

    /// Runs one attempt for a user-selected file.
    ///
    /// A non-image file is rejected before the pipeline is touched. Once
    /// accepted, the attempt always ends in a record or a notice.
    pub async fn submit(&self, source: ImageSource) -> Result<AttemptOutcome, PipelineBusy> {
        if self.is_busy() {
            return Err(PipelineBusy);
        }

        let mime_type = match source.validate() {
            Ok(mime_type) => mime_type,
            Err(err) => {
                log_warn!("rejected {}: {}", source.display_name(), err);
                return Ok(self.reject(Notice::invalid_file_type()));
            }
        };

        let guard = self.begin(PipelineStatus::Encoding)?;
        log_info!("inspection started for {} ({})", source.display_name(), mime_type);

        let image = match source.load(&mime_type).await {
            Ok(image) => image,
            Err(err) => {
                log_warn!("could not read {}: {}", source.display_name(), err);
                return Ok(self.reject(Notice::file_error()));
            }
        };

        guard.advance(PipelineStatus::Inspecting);
        Ok(self.run(guard, image).await)
    }

    /// Runs one attempt for an already encoded camera frame.
    pub async fn submit_capture(&self, image: EncodedImage) -> Result<AttemptOutcome, PipelineBusy> {
        let guard = self.begin(PipelineStatus::Inspecting)?;
        log_info!("inspection started for camera capture");
        Ok(self.run(guard, image).await)
    }

    /// Marks the pipeline busy before an image exists, so the caller can do
    /// work (capturing a frame) that must not race another submission.
    /// Dropping the guard without inspecting frees the pipeline again.
    pub fn reserve(&self) -> Result<BusyGuard, PipelineBusy> {
        self.begin(PipelineStatus::Encoding)
    }

    /// Completes an attempt started with [`reserve`](Self::reserve).
    pub async fn submit_reserved(&self, guard: BusyGuard, image: EncodedImage) -> AttemptOutcome {
        log_info!("inspection started for reserved capture");
        guard.advance(PipelineStatus::Inspecting);
        self.run(guard, image).await
    }

    fn begin(&self, initial: PipelineStatus) -> Result<BusyGuard, PipelineBusy> {
        {
            let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
            if status.is_busy() {
                return Err(PipelineBusy);
            }
            *status = initial;
        }
        events::emit(self.sink.as_ref(), events::INSPECTION_STATUS_CHANGED, &initial);
        Ok(BusyGuard {
            status: self.status.clone(),
            sink: self.sink.clone(),
        })
    }

    /// `_guard` is held until the attempt has produced its outcome.
    async fn run(&self, _guard: BusyGuard, image: EncodedImage) -> AttemptOutcome {
        let strategy = self
            .strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        log_info!(
            "inspecting {} bytes ({}) with {:?}",
            image.len(),
            image.mime_type(),
            strategy.kind()
        );

        match strategy.inspect(&image).await {
            Ok(outcome) => {
                let record = self.log.append(image, outcome);
                log_info!(
                    "inspection {} recorded: {}",
                    record.id(),
                    record.verdict().as_str()
                );
                events::emit(
                    self.sink.as_ref(),
                    events::INSPECTION_RECORDED,
                    &ResultView::from_record(&record),
                );
                AttemptOutcome::Recorded { record }
            }
            Err(err) => {
                log_error!("inspection failed: {}", err);
                self.reject(Notice::inspection_failed())
            }
        }
    }

    fn reject(&self, notice: Notice) -> AttemptOutcome {
        notice.emit(self.sink.as_ref());
        AttemptOutcome::Rejected { notice }
    }
}
