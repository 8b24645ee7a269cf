//! Terminal front end: line parsing and a stdout screen.
//!
//! A keyboard-wedge scanner types each barcode followed by Enter, so every
//! plain line is a scan. Operator commands start with `:`.
use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

use crate::controller::{FormView, Notice, NoticeKind};
use crate::devices::ScreenSink;
use crate::station::StationInput;

pub const HELP: &str = "\
commands:
  <barcode>        scan (fabricator FC..., mattress HORO/HOR/VERO/VER/LAMI...)
  :add <code>      type a mattress code by hand
  :rm <n>          remove mattress n from the list
  :shift D|N       select the shift
  :clear           clear the fabricator
  :save            submit the batch
  :list            show the form
  :dismiss         hide the current message
  :help            this text
  :quit            leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Input(StationInput),
    Help,
    Unknown(String),
}

pub fn parse_line(line: &str) -> Option<Line> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Some(command) = trimmed.strip_prefix(':') else {
        return Some(Line::Input(StationInput::Scan(trimmed.to_string())));
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    let input = match name {
        "add" => StationInput::ManualAdd(arg.to_string()),
        "rm" => match arg.parse::<usize>() {
            Ok(n) if n >= 1 => StationInput::RemoveMattress(n - 1),
            _ => return Some(Line::Unknown(trimmed.to_string())),
        },
        "shift" => StationInput::SelectShift(arg.to_string()),
        "clear" => StationInput::ClearFabricator,
        "save" => StationInput::Submit,
        "list" => StationInput::ShowForm,
        "dismiss" => StationInput::DismissNotice,
        "quit" | "q" => StationInput::Shutdown,
        "help" | "h" => return Some(Line::Help),
        _ => return Some(Line::Unknown(trimmed.to_string())),
    };
    Some(Line::Input(input))
}

/// Prints the form after every change, with the current notice as a banner.
/// Success banners expire on their own; failure banners stay until
/// dismissed or replaced.
#[derive(Debug, Default)]
pub struct TerminalScreen {
    banner: Mutex<Option<(Notice, Instant)>>,
}

impl TerminalScreen {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_banner(&self) -> Option<Notice> {
        let mut guard = self.banner.lock().ok()?;
        let expired = match guard.as_ref() {
            Some((notice, shown_at)) => notice
                .auto_dismiss
                .map_or(false, |after| shown_at.elapsed() >= after),
            None => false,
        };
        if expired {
            *guard = None;
        }
        guard.as_ref().map(|(notice, _)| notice.clone())
    }
}

pub fn banner_line(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Success => format!("[ok] {}", notice.message),
        NoticeKind::Failure => format!("[!!] {}  (:dismiss)", notice.message),
    }
}

impl ScreenSink for TerminalScreen {
    fn notify(&self, notice: &Notice) {
        if let Ok(mut guard) = self.banner.lock() {
            *guard = Some((notice.clone(), Instant::now()));
        }
    }

    fn render(&self, view: &FormView) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "----------------------------------------");
        if let Some(notice) = self.current_banner() {
            let _ = writeln!(out, "{}", banner_line(&notice));
        }
        let _ = writeln!(out, "{view}");
        let _ = out.flush();
    }

    fn dismiss(&self) {
        if let Ok(mut guard) = self.banner.lock() {
            *guard = None;
        }
    }
}
