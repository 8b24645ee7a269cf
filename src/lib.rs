//! Factory-floor scan station: classify fabricator and mattress barcodes,
//! assemble a batch and post it to the scan endpoint.

pub mod api;
pub mod batch;
pub mod classify;
pub mod config;
pub mod controller;
pub mod devices;
pub mod model;
pub mod station;
pub mod terminal;
