//! Screen controller: routes scans and operator actions into the batch and
//! owns the `Idle`/`Submitting` state machine.
//!
//! The controller is synchronous and never touches the network. A submission
//! is started with [`ScreenController::begin_submit`], which hands back a
//! snapshot of the batch, and finished with
//! [`ScreenController::finish_submit`] once the outcome is known. Every call
//! that produces operator feedback returns it as a [`Notice`].
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::batch::{BatchError, BatchState, MissingField};
use crate::classify::{classify, Classification};
use crate::model::{ScanEvent, Shift, SubmissionOutcome};

pub mod messages {
    pub const MISSING_FABRICATOR: &str = "Please scan a Fabricator";
    pub const MISSING_MATTRESS: &str = "Please add at least one Mattress";
    pub const INVALID_SHIFT: &str = "Please select a valid Shift (D/N)";
    pub const EMPTY_MANUAL_ENTRY: &str = "Please enter a mattress code";
    pub const DUPLICATE_MATTRESS: &str = "This mattress is already added";
    pub const INVALID_CODE: &str = "Invalid mattress code format";
    pub const SAVED: &str = "Saved successfully!";
    pub const DUPLICATE_OR_NOT_FOUND: &str =
        "Error: Fabricator scan already exists or mattress not found";
    pub const CLEAR_DISABLED: &str = "Fields are locked while saving";
    pub const REQUEST_NOT_BUILT: &str = "Error creating request";
}

pub const SUBMIT_LABEL: &str = "Save";
pub const SUBMITTING_LABEL: &str = "Saving...";
pub const DEFAULT_SUCCESS_NOTICE: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Transient operator message. Failures stay until dismissed
/// (`auto_dismiss == None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub auto_dismiss: Option<Duration>,
}

impl Notice {
    pub fn success(message: impl Into<String>, after: Duration) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            auto_dismiss: Some(after),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
            auto_dismiss: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}

/// Enabled state of the form's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub submit_enabled: bool,
    pub clear_enabled: bool,
}

impl Controls {
    fn unlocked() -> Self {
        Self {
            submit_enabled: true,
            clear_enabled: true,
        }
    }

    fn locked() -> Self {
        Self {
            submit_enabled: false,
            clear_enabled: false,
        }
    }
}

pub enum SubmitStart {
    /// Submission may proceed with this snapshot of the batch.
    Started(BatchState),
    Rejected(Notice),
    /// A submission is already in flight; the submit control is disabled.
    Busy,
}

/// Render snapshot of the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub phase: Phase,
    pub fabricator: Option<String>,
    pub mattresses: Vec<String>,
    pub shift: Option<Shift>,
    pub controls: Controls,
}

impl FormView {
    pub fn count_label(&self) -> String {
        format!("Mattresses: {}", self.mattresses.len())
    }

    pub fn submit_label(&self) -> &'static str {
        match self.phase {
            Phase::Idle => SUBMIT_LABEL,
            Phase::Submitting => SUBMITTING_LABEL,
        }
    }
}

impl fmt::Display for FormView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fabricator: {}", self.fabricator.as_deref().unwrap_or("-"))?;
        writeln!(
            f,
            "Shift: {}",
            self.shift.map(|s| s.as_str()).unwrap_or("-")
        )?;
        writeln!(f, "{}", self.count_label())?;
        for (i, code) in self.mattresses.iter().enumerate() {
            writeln!(f, "  {:>2}. {}", i + 1, code)?;
        }
        let state = if self.controls.submit_enabled { "" } else { " (disabled)" };
        write!(f, "[{}]{}", self.submit_label(), state)
    }
}

#[derive(Debug)]
pub struct ScreenController {
    batch: BatchState,
    phase: Phase,
    controls: Controls,
    success_notice: Duration,
    /// Snapshot handed out by `begin_submit`, kept until the outcome arrives.
    in_flight: Option<BatchState>,
}

impl Default for ScreenController {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_NOTICE)
    }
}

impl ScreenController {
    pub fn new(success_notice: Duration) -> Self {
        Self {
            batch: BatchState::new(),
            phase: Phase::Idle,
            controls: Controls::unlocked(),
            success_notice,
            in_flight: None,
        }
    }

    pub fn batch(&self) -> &BatchState {
        &self.batch
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn view(&self) -> FormView {
        FormView {
            phase: self.phase,
            fabricator: self.batch.fabricator().map(str::to_string),
            mattresses: self.batch.mattresses().to_vec(),
            shift: self.batch.shift(),
            controls: self.controls,
        }
    }

    /// Route a scanner decode. Works in either phase.
    pub fn handle_scan(&mut self, event: &ScanEvent) -> Option<Notice> {
        match classify(&event.raw_text) {
            Classification::Fabricator(code) => {
                info!(%code, "fabricator scanned");
                self.batch.set_fabricator(code);
                None
            }
            Classification::Mattress(code) => self.add_mattress(code),
            Classification::Invalid => {
                debug!(raw = %event.raw_text, "unrecognised scan");
                Some(Notice::failure(messages::INVALID_CODE))
            }
        }
    }

    /// Typed entry from the mattress field. Fabricator codes are scan-only.
    pub fn manual_add(&mut self, text: &str) -> Option<Notice> {
        if text.trim().is_empty() {
            return Some(Notice::failure(messages::EMPTY_MANUAL_ENTRY));
        }
        match classify(text) {
            Classification::Mattress(code) => self.add_mattress(code),
            Classification::Fabricator(_) | Classification::Invalid => {
                Some(Notice::failure(messages::INVALID_CODE))
            }
        }
    }

    fn add_mattress(&mut self, code: String) -> Option<Notice> {
        match self.batch.add_mattress(code.clone()) {
            Ok(()) => {
                info!(%code, count = self.batch.mattresses().len(), "mattress added");
                None
            }
            Err(BatchError::AlreadyPresent(_)) => {
                debug!(%code, "duplicate mattress");
                Some(Notice::failure(messages::DUPLICATE_MATTRESS))
            }
            Err(err) => Some(Notice::failure(err.to_string())),
        }
    }

    pub fn remove_mattress(&mut self, index: usize) -> Option<Notice> {
        match self.batch.remove_mattress_at(index) {
            Ok(code) => {
                info!(%code, "mattress removed");
                None
            }
            Err(err) => Some(Notice::failure(err.to_string())),
        }
    }

    pub fn select_shift(&mut self, text: &str) -> Option<Notice> {
        match text.parse::<Shift>() {
            Ok(shift) => {
                self.batch.set_shift(shift);
                None
            }
            Err(_) => Some(Notice::failure(messages::INVALID_SHIFT)),
        }
    }

    pub fn clear_fabricator(&mut self) -> Option<Notice> {
        if !self.controls.clear_enabled {
            return Some(Notice::failure(messages::CLEAR_DISABLED));
        }
        self.batch.clear_fabricator();
        None
    }

    pub fn begin_submit(&mut self) -> SubmitStart {
        if self.phase == Phase::Submitting || !self.controls.submit_enabled {
            return SubmitStart::Busy;
        }
        if let Some(missing) = self.batch.missing_field() {
            let message = match missing {
                MissingField::Fabricator => messages::MISSING_FABRICATOR,
                MissingField::Mattresses => messages::MISSING_MATTRESS,
                MissingField::Shift => messages::INVALID_SHIFT,
            };
            return SubmitStart::Rejected(Notice::failure(message));
        }
        self.phase = Phase::Submitting;
        self.controls = Controls::locked();
        info!(
            mattresses = self.batch.mattresses().len(),
            "submission started"
        );
        self.in_flight = Some(self.batch.clone());
        SubmitStart::Started(self.batch.clone())
    }

    /// Resolve the in-flight submission. The batch is kept on every failure so
    /// the operator can retry without scanning again. A success clears the
    /// whole batch; anything scanned while saving is named in a failure notice
    /// so it can be scanned again.
    pub fn finish_submit(&mut self, outcome: SubmissionOutcome) -> Notice {
        if self.phase != Phase::Submitting {
            warn!(?outcome, "submission outcome without a submission in flight");
        }
        self.phase = Phase::Idle;
        self.controls = Controls::unlocked();
        let submitted = self.in_flight.take();
        match outcome {
            SubmissionOutcome::Success => {
                let unsent = submitted
                    .map(|snapshot| unsent_scans(&snapshot, &self.batch))
                    .unwrap_or_default();
                self.batch.clear();
                if unsent.is_empty() {
                    Notice::success(messages::SAVED, self.success_notice)
                } else {
                    warn!(?unsent, "scans made while saving were cleared");
                    Notice::failure(format!(
                        "Saved, but scans made while saving were cleared: {}. Scan them again",
                        unsent.join(", ")
                    ))
                }
            }
            SubmissionOutcome::DuplicateOrNotFound => {
                Notice::failure(messages::DUPLICATE_OR_NOT_FOUND)
            }
            SubmissionOutcome::ServerError(code) => {
                Notice::failure(format!("Server error ({code})"))
            }
            SubmissionOutcome::NetworkFailure(message) => {
                Notice::failure(format!("Network error: {message}"))
            }
            SubmissionOutcome::RequestNotBuilt(reason) => {
                warn!(%reason, "scan request not built");
                Notice::failure(messages::REQUEST_NOT_BUILT)
            }
        }
    }
}

/// Codes in `live` that were not part of the submitted `snapshot`.
fn unsent_scans(snapshot: &BatchState, live: &BatchState) -> Vec<String> {
    let mut unsent = Vec::new();
    if let Some(code) = live.fabricator() {
        if snapshot.fabricator() != Some(code) {
            unsent.push(code.to_string());
        }
    }
    unsent.extend(
        live.mattresses()
            .iter()
            .filter(|code| !snapshot.mattresses().contains(code))
            .cloned(),
    );
    unsent
}
