//! In-memory batch being assembled on the form.
//!
//! Created empty when the station opens and cleared after every successful
//! submission; nothing is persisted.
use crate::model::{ScanPayload, Shift};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("mattress {0} is already in the batch")]
    AlreadyPresent(String),
    #[error("no mattress at position {index} (batch holds {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("batch is incomplete: {0}")]
    Incomplete(MissingField),
}

/// First required field a batch is missing, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Fabricator,
    Mattresses,
    Shift,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MissingField::Fabricator => "no fabricator",
            MissingField::Mattresses => "no mattresses",
            MissingField::Shift => "no shift",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchState {
    fabricator: Option<String>,
    mattresses: Vec<String>,
    shift: Option<Shift>,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fabricator(&self) -> Option<&str> {
        self.fabricator.as_deref()
    }

    pub fn mattresses(&self) -> &[String] {
        &self.mattresses
    }

    pub fn shift(&self) -> Option<Shift> {
        self.shift
    }

    pub fn set_fabricator(&mut self, code: impl Into<String>) {
        self.fabricator = Some(code.into());
    }

    pub fn clear_fabricator(&mut self) {
        self.fabricator = None;
    }

    pub fn add_mattress(&mut self, code: impl Into<String>) -> Result<(), BatchError> {
        let code = code.into();
        if self.mattresses.contains(&code) {
            return Err(BatchError::AlreadyPresent(code));
        }
        self.mattresses.push(code);
        Ok(())
    }

    /// Remove the mattress at `index`, shifting later entries up.
    pub fn remove_mattress_at(&mut self, index: usize) -> Result<String, BatchError> {
        if index >= self.mattresses.len() {
            return Err(BatchError::OutOfRange {
                index,
                len: self.mattresses.len(),
            });
        }
        Ok(self.mattresses.remove(index))
    }

    pub fn set_shift(&mut self, shift: Shift) {
        self.shift = Some(shift);
    }

    pub fn missing_field(&self) -> Option<MissingField> {
        if self.fabricator.as_deref().map_or(true, str::is_empty) {
            return Some(MissingField::Fabricator);
        }
        if self.mattresses.is_empty() {
            return Some(MissingField::Mattresses);
        }
        if self.shift.is_none() {
            return Some(MissingField::Shift);
        }
        None
    }

    pub fn is_submit_eligible(&self) -> bool {
        self.missing_field().is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Build the request body stamped with `timestamp`. Fields are checked in
    /// the same order as [`BatchState::missing_field`].
    pub fn to_payload(&self, timestamp: impl Into<String>) -> Result<ScanPayload, BatchError> {
        let fabricator = match self.fabricator.as_deref() {
            Some(code) if !code.is_empty() => code,
            _ => return Err(BatchError::Incomplete(MissingField::Fabricator)),
        };
        if self.mattresses.is_empty() {
            return Err(BatchError::Incomplete(MissingField::Mattresses));
        }
        let Some(shift) = self.shift else {
            return Err(BatchError::Incomplete(MissingField::Shift));
        };
        Ok(ScanPayload {
            fabricator: fabricator.to_string(),
            timestamp: timestamp.into(),
            shift,
            mattresses: self.mattresses.clone(),
        })
    }
}
