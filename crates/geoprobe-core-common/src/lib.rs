//! Common types and traits shared across `geoprobe` crates.
//!
//! This crate provides the core abstractions that are shared between
//! `geoprobe-core` and the format driver crates, preventing circular dependencies.

pub mod drivers;
pub mod envelope;
pub mod factory;
pub mod io;
pub mod options;
pub mod srs;

// Re-export commonly used types
pub use drivers::{Driver, DriverCapabilities, SupportStatus};
pub use envelope::{Envelope, EnvelopeBuilder};
pub use factory::DriverRegistry;
pub use io::{FormatDriver, VectorDataset, VectorLayer};
pub use options::OpenOptions;
pub use probe_shared::{FormatReadError, FormatResult, SourcePosition};
pub use srs::{SpatialReference, SrsError};
