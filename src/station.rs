//! Station event loop.
//!
//! Scanner decodes, operator input and submission results are multiplexed on
//! one task, so the controller is only ever touched from here. The network
//! call runs on a spawned task and reports back over a channel.
//!
//! [`StationInput`] is applied strictly in arrival order. A scanner that types
//! into the same stream as the operator (keyboard wedge) sends its decodes as
//! [`StationInput::Scan`] so a barcode read after save can never overtake it.
//! A [`ScanSource`] is for scanners with their own channel.
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::api::{self, ScanApi};
use crate::controller::{Notice, ScreenController, SubmitStart};
use crate::devices::{FeedbackSink, ScanSource, ScreenSink};
use crate::model::{ScanEvent, SubmissionOutcome};

/// Operator actions, plus decodes from a scanner sharing the operator's stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationInput {
    Scan(String),
    ManualAdd(String),
    /// Zero-based position in the mattress list.
    RemoveMattress(usize),
    SelectShift(String),
    ClearFabricator,
    Submit,
    ShowForm,
    DismissNotice,
    Shutdown,
}

pub struct Station {
    controller: ScreenController,
    api: Arc<dyn ScanApi>,
    feedback: Arc<dyn FeedbackSink>,
    screen: Arc<dyn ScreenSink>,
}

impl Station {
    pub fn new(
        controller: ScreenController,
        api: Arc<dyn ScanApi>,
        feedback: Arc<dyn FeedbackSink>,
        screen: Arc<dyn ScreenSink>,
    ) -> Self {
        Self {
            controller,
            api,
            feedback,
            screen,
        }
    }

    /// Run until `Shutdown` arrives or the input channel closes. An in-flight
    /// submission is allowed to finish before the scanner is released.
    /// Returns the controller so its final state can be inspected.
    #[instrument(skip_all)]
    pub async fn run<S: ScanSource>(
        mut self,
        source: &mut S,
        mut inputs: mpsc::Receiver<StationInput>,
    ) -> Result<ScreenController> {
        source.open().await.context("failed to open scanner")?;
        info!("station ready");

        let (done_tx, mut done_rx) = mpsc::channel::<SubmissionOutcome>(1);
        let mut scanner_live = true;
        let mut stopping = false;
        self.screen.render(&self.controller.view());

        loop {
            if stopping && !self.controller.is_submitting() {
                break;
            }
            tokio::select! {
                decode = source.next_decode(), if scanner_live && !stopping => match decode {
                    Some(raw) => self.scan(raw),
                    None => {
                        info!("scanner stream ended");
                        scanner_live = false;
                    }
                },
                input = inputs.recv(), if !stopping => match input {
                    Some(StationInput::Shutdown) | None => {
                        debug!("station stopping");
                        stopping = true;
                    }
                    Some(input) => self.apply(input, &done_tx),
                },
                Some(outcome) = done_rx.recv() => {
                    let notice = self.controller.finish_submit(outcome);
                    self.publish(Some(notice));
                }
            }
        }

        source.close().await;
        info!("station stopped");
        Ok(self.controller)
    }

    fn apply(&mut self, input: StationInput, done_tx: &mpsc::Sender<SubmissionOutcome>) {
        let notice = match input {
            StationInput::Scan(raw) => return self.scan(raw),
            StationInput::ManualAdd(text) => self.controller.manual_add(&text),
            StationInput::RemoveMattress(index) => self.controller.remove_mattress(index),
            StationInput::SelectShift(text) => self.controller.select_shift(&text),
            StationInput::ClearFabricator => self.controller.clear_fabricator(),
            StationInput::Submit => self.start_submission(done_tx),
            StationInput::ShowForm => None,
            StationInput::DismissNotice => {
                self.screen.dismiss();
                None
            }
            StationInput::Shutdown => return,
        };
        self.publish(notice);
    }

    fn scan(&mut self, raw: String) {
        self.feedback.scan_received();
        let notice = self.controller.handle_scan(&ScanEvent::new(raw));
        self.publish(notice);
    }

    fn start_submission(&mut self, done_tx: &mpsc::Sender<SubmissionOutcome>) -> Option<Notice> {
        match self.controller.begin_submit() {
            SubmitStart::Started(batch) => {
                let api = Arc::clone(&self.api);
                let done_tx = done_tx.clone();
                tokio::spawn(async move {
                    let outcome = match api::submit(api.as_ref(), &batch).await {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            error!(?err, "submission refused before sending");
                            SubmissionOutcome::RequestNotBuilt(err.to_string())
                        }
                    };
                    if done_tx.send(outcome).await.is_err() {
                        error!("station gone before submission resolved");
                    }
                });
                None
            }
            SubmitStart::Rejected(notice) => Some(notice),
            SubmitStart::Busy => {
                debug!("submit ignored while saving");
                None
            }
        }
    }

    fn publish(&self, notice: Option<Notice>) {
        if let Some(notice) = notice {
            self.screen.notify(&notice);
        }
        self.screen.render(&self.controller.view());
    }
}
