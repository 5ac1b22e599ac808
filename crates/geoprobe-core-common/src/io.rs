//! Traits that format drivers implement to expose datasets and layers.
//!
//! Accessors return `Option`/`Result` rather than nullable handles: a missing
//! layer, an absent spatial reference and an empty extent are all values the
//! caller has to deal with explicitly.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::drivers::Driver;
use crate::envelope::Envelope;
use crate::options::OpenOptions;
use crate::srs::SpatialReference;
use probe_shared::FormatResult;

/// A single collection of features sharing one spatial reference.
pub trait VectorLayer: fmt::Debug {
    /// Name of the layer, usually derived from the file name.
    fn name(&self) -> &str;

    /// Number of features in the layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the features cannot be enumerated.
    fn feature_count(&self) -> FormatResult<u64>;

    /// Bounding envelope of all geometries in the layer.
    ///
    /// Returns `Ok(None)` when the layer holds no geometry at all. Drivers
    /// without a precomputed extent scan every feature.
    ///
    /// # Errors
    ///
    /// Returns an error if a geometry cannot be read or decoded.
    fn extent(&self) -> FormatResult<Option<Envelope>>;

    /// Spatial reference of the layer, if the dataset declares one.
    fn spatial_ref(&self) -> Option<&SpatialReference>;
}

/// An opened dataset. Layers borrow from it and cannot outlive it.
pub trait VectorDataset: fmt::Debug {
    /// Descriptor of the driver that opened the dataset.
    fn driver(&self) -> &'static Driver;

    /// Path the dataset was opened from.
    fn path(&self) -> &Path;

    fn layer_count(&self) -> usize;

    /// Layer at `index`, or `None` when out of range.
    fn layer(&self, index: usize) -> Option<&dyn VectorLayer>;
}

/// A format driver: recognises and opens datasets of one format.
pub trait FormatDriver: Send + Sync {
    /// Static description of the driver.
    fn descriptor(&self) -> &'static Driver;

    /// Cheap check (extension, magic bytes) whether `path` looks like this
    /// format. Must not fail; unreadable paths are simply not identified.
    fn identify(&self, path: &Path) -> bool;

    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be read or is not valid for
    /// this format.
    fn open(&self, path: &Path, options: &OpenOptions) -> FormatResult<Box<dyn VectorDataset>>;

    /// Open option keys this driver understands.
    fn accepted_options(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Dataset made of an ordered list of layers of one concrete type.
///
/// Most formats expose exactly one layer; the shapefile driver exposes one
/// per file when given a directory.
#[derive(Debug)]
pub struct LayeredDataset<L> {
    driver: &'static Driver,
    path: PathBuf,
    layers: Vec<L>,
}

impl<L: VectorLayer> LayeredDataset<L> {
    pub fn new(driver: &'static Driver, path: impl Into<PathBuf>, layers: Vec<L>) -> Self {
        Self {
            driver,
            path: path.into(),
            layers,
        }
    }

    pub fn single(driver: &'static Driver, path: impl Into<PathBuf>, layer: L) -> Self {
        Self::new(driver, path, vec![layer])
    }
}

impl<L: VectorLayer> VectorDataset for LayeredDataset<L> {
    fn driver(&self) -> &'static Driver {
        self.driver
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer(&self, index: usize) -> Option<&dyn VectorLayer> {
        self.layers.get(index).map(|layer| layer as &dyn VectorLayer)
    }
}
