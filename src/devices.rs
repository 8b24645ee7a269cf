//! Capability seams for the station's hardware and display.
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::debug;

use crate::controller::{FormView, Notice};

/// Source of decoded barcodes. Opened when the station starts and closed when
/// it stops; each `open` is paired with exactly one `close`.
#[async_trait]
pub trait ScanSource: Send {
    async fn open(&mut self) -> Result<()>;

    /// Next decoded barcode, or `None` once the source has ended.
    async fn next_decode(&mut self) -> Option<String>;

    async fn close(&mut self);
}

/// Side effect fired for every decode the scanner delivers.
pub trait FeedbackSink: Send + Sync {
    fn scan_received(&self);
}

/// Where notices and the form are shown.
pub trait ScreenSink: Send + Sync {
    fn notify(&self, notice: &Notice);
    fn render(&self, view: &FormView);
    fn dismiss(&self);
}

/// Scan source fed through a channel, e.g. by a stdin reader task.
#[derive(Debug)]
pub struct ChannelScanSource {
    rx: mpsc::Receiver<String>,
    open: bool,
}

impl ChannelScanSource {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx, open: false }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[async_trait]
impl ScanSource for ChannelScanSource {
    async fn open(&mut self) -> Result<()> {
        if self.open {
            bail!("scanner already open");
        }
        self.open = true;
        debug!("scanner opened");
        Ok(())
    }

    async fn next_decode(&mut self) -> Option<String> {
        if !self.open {
            return None;
        }
        self.rx.recv().await
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            debug!("scanner closed");
        }
    }
}

/// Keyboard-wedge scanner: it types each decode into the operator's input
/// stream, where it arrives as [`crate::station::StationInput::Scan`]. The
/// source itself never yields.
#[derive(Debug, Default)]
pub struct WedgeScanner {
    open: bool,
}

impl WedgeScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[async_trait]
impl ScanSource for WedgeScanner {
    async fn open(&mut self) -> Result<()> {
        if self.open {
            bail!("scanner already open");
        }
        self.open = true;
        Ok(())
    }

    async fn next_decode(&mut self) -> Option<String> {
        std::future::pending().await
    }

    async fn close(&mut self) {
        self.open = false;
    }
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl FeedbackSink for TerminalBell {
    fn scan_received(&self) {
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentFeedback;

impl FeedbackSink for SilentFeedback {
    fn scan_received(&self) {}
}
