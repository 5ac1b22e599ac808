//! `geoprobe-core` is the core library of `geoprobe`, a tool that reports the
//! extent and spatial reference of a vector geospatial dataset.
//!
//! This crate includes:
//! - **Driver Registry**: the catalogue of known formats and the one-time
//!   registration of the linked format drivers.
//! - **Probe**: opening a dataset and reading its first layer's extent and
//!   spatial reference.
//! - **Errors**: one error kind, and exit code, per failure mode.

pub mod drivers;
pub mod error;
pub mod operations;
pub mod options;
pub mod types;
pub mod utils;

pub use drivers::register_all_drivers;
pub use error::{ErrorKind, ProbeError, Result};
pub use operations::{DatasetHandle, open_dataset, probe};
pub use options::ProbeOptions;
pub use types::{LayerInfo, ProbeReport, SrsInfo};

pub use geoprobe_core_common::{Envelope, OpenOptions, SpatialReference};
