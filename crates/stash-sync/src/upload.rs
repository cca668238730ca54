//! Single-file upload state machine.
//!
//! ```text
//! Idle -> Selected -> Uploading -> Succeeded -(result expiry)-> Idle
//!                              \-> Failed -(retry)-> Selected
//! ```
//!
//! The current [`UploadView`] is published on a watch channel. Every transition is a
//! single update of that channel, which is what makes the `Selected -> Uploading`
//! check-and-set atomic: two racing `submit()` calls cannot both start an upload.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cache::QueryInvalidator;
use stash_api_client::FileCatalog;
use stash_core::error::{NO_FILE_SELECTED_MESSAGE, UPLOAD_FAILED_MESSAGE};
use stash_core::models::{FileCandidate, UploadOutcome};
use stash_core::{ClientConfig, ClientError, ClientResult, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Selected,
    Uploading,
    Succeeded,
    Failed,
}

impl Display for UploadPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Selected => "selected",
            UploadPhase::Uploading => "uploading",
            UploadPhase::Succeeded => "succeeded",
            UploadPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything a UI needs to render the upload panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadView {
    pub phase: UploadPhase,
    pub candidate: Option<FileCandidate>,
    pub outcome: Option<UploadOutcome>,
    /// Inline error shown next to the upload control.
    pub error: Option<String>,
    generation: u64,
}

impl UploadView {
    /// Incremented on every transition. A result-expiry timer only clears the view
    /// it was armed for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn transition(&mut self, phase: UploadPhase) {
        self.phase = phase;
        self.generation += 1;
    }
}

pub struct UploadCoordinator {
    catalog: Arc<dyn FileCatalog>,
    invalidator: Arc<dyn QueryInvalidator>,
    state: Arc<watch::Sender<UploadView>>,
    expiry: Mutex<Option<JoinHandle<()>>>,
    result_ttl: Duration,
}

impl UploadCoordinator {
    pub fn new(
        catalog: Arc<dyn FileCatalog>,
        invalidator: Arc<dyn QueryInvalidator>,
        result_ttl: Duration,
    ) -> Self {
        let (state, _) = watch::channel(UploadView::default());
        Self {
            catalog,
            invalidator,
            state: Arc::new(state),
            expiry: Mutex::new(None),
            result_ttl,
        }
    }

    pub fn from_config(
        catalog: Arc<dyn FileCatalog>,
        invalidator: Arc<dyn QueryInvalidator>,
        config: &ClientConfig,
    ) -> Self {
        Self::new(catalog, invalidator, config.result_display)
    }

    pub fn view(&self) -> UploadView {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadView> {
        self.state.subscribe()
    }

    pub fn has_pending_expiry(&self) -> bool {
        self.expiry_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Choose the file for the next upload, replacing any previous choice or result.
    pub fn select_file(&self, candidate: Option<FileCandidate>) -> ClientResult<()> {
        let mut rejection = None;
        self.state.send_if_modified(|view| {
            if view.phase == UploadPhase::Uploading {
                rejection = Some(ClientError::UploadInProgress);
                return false;
            }
            match candidate {
                Some(candidate) => {
                    view.candidate = Some(candidate);
                    view.outcome = None;
                    view.error = None;
                    view.transition(UploadPhase::Selected);
                }
                None => {
                    view.error = Some(NO_FILE_SELECTED_MESSAGE.to_string());
                    rejection = Some(ClientError::validation(NO_FILE_SELECTED_MESSAGE));
                }
            }
            true
        });

        match rejection {
            Some(err) => Err(err),
            None => {
                self.cancel_expiry();
                let view = self.state.borrow();
                if let Some(candidate) = &view.candidate {
                    tracing::debug!(
                        file_name = %candidate.file_name,
                        size = candidate.size(),
                        "File selected"
                    );
                }
                Ok(())
            }
        }
    }

    /// Upload the selected file.
    ///
    /// A failed upload is not an error here: it is recorded in the view and returned
    /// as [`UploadOutcome::Failure`]. Only calls that were refused before reaching the
    /// server return `Err`.
    pub async fn submit(&self) -> ClientResult<UploadOutcome> {
        let mut rejection = None;
        let mut started = None;
        self.state.send_if_modified(|view| match view.phase {
            UploadPhase::Uploading => {
                rejection = Some(ClientError::UploadInProgress);
                false
            }
            UploadPhase::Selected if view.candidate.is_some() => {
                started = view.candidate.clone();
                view.error = None;
                view.transition(UploadPhase::Uploading);
                true
            }
            UploadPhase::Failed if view.candidate.is_some() => {
                rejection = Some(ClientError::validation(
                    "Previous upload failed; retry it or select another file",
                ));
                false
            }
            _ => {
                view.error = Some(NO_FILE_SELECTED_MESSAGE.to_string());
                rejection = Some(ClientError::validation(NO_FILE_SELECTED_MESSAGE));
                true
            }
        });

        if let Some(err) = rejection {
            tracing::debug!(error = %err, "Upload submit rejected");
            return Err(err);
        }
        let Some(candidate) = started else {
            return Err(ClientError::validation(NO_FILE_SELECTED_MESSAGE));
        };

        self.cancel_expiry();
        tracing::info!(
            file_name = %candidate.file_name,
            size_kb = candidate.size_kb(),
            "Upload started"
        );

        match self.catalog.upload_file(&candidate).await {
            Ok(response) => {
                let outcome = UploadOutcome::from_response(response);
                tracing::info!(
                    file_name = %candidate.file_name,
                    is_duplicate = outcome.is_duplicate(),
                    space_saved = ?outcome.space_saved(),
                    "Upload finished"
                );

                self.invalidator.invalidate(&QueryKey::UPLOAD_AFFECTED).await;

                let mut generation = 0;
                self.state.send_modify(|view| {
                    view.candidate = None;
                    view.outcome = Some(outcome.clone());
                    view.error = None;
                    view.transition(UploadPhase::Succeeded);
                    generation = view.generation;
                });
                self.schedule_expiry(generation);
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(
                    file_name = %candidate.file_name,
                    status = ?err.status(),
                    error = %err,
                    "Upload failed"
                );

                let outcome = UploadOutcome::failure(UPLOAD_FAILED_MESSAGE);
                self.state.send_modify(|view| {
                    view.outcome = Some(outcome.clone());
                    view.error = Some(UPLOAD_FAILED_MESSAGE.to_string());
                    view.transition(UploadPhase::Failed);
                });
                Ok(outcome)
            }
        }
    }

    /// Resubmit the file kept from a failed upload.
    pub async fn retry(&self) -> ClientResult<UploadOutcome> {
        let mut rejection = None;
        self.state.send_if_modified(|view| match view.phase {
            UploadPhase::Failed if view.candidate.is_some() => {
                view.outcome = None;
                view.error = None;
                view.transition(UploadPhase::Selected);
                true
            }
            UploadPhase::Uploading => {
                rejection = Some(ClientError::UploadInProgress);
                false
            }
            _ => {
                rejection = Some(ClientError::validation("No failed upload to retry"));
                false
            }
        });

        if let Some(err) = rejection {
            return Err(err);
        }
        tracing::info!("Retrying failed upload");
        self.submit().await
    }

    fn schedule_expiry(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let ttl = self.result_ttl;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let cleared = state.send_if_modified(|view| {
                if view.generation != generation || view.phase != UploadPhase::Succeeded {
                    return false;
                }
                view.outcome = None;
                view.error = None;
                view.transition(UploadPhase::Idle);
                true
            });
            if cleared {
                tracing::debug!("Upload result cleared");
            }
        });

        if let Some(previous) = self.expiry_slot().replace(handle) {
            previous.abort();
        }
    }

    fn cancel_expiry(&self) {
        if let Some(handle) = self.expiry_slot().take() {
            handle.abort();
        }
    }

    fn expiry_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.expiry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for UploadCoordinator {
    fn drop(&mut self) {
        self.cancel_expiry();
    }
}
