//! Python bindings (enabled with the `pyo3` feature)
//!
//! The boundary is deliberately narrow: configuration goes in as JSON,
//! snapshots and run summaries come out as JSON. Plotting and export live
//! on the Python side.

pub mod model;
