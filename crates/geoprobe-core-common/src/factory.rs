//! Registry of format drivers available to the probe.
//!
//! The registry is plain data; `geoprobe-core` owns the process-wide
//! instance and fills it once with every driver it links.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::drivers::Driver;
use crate::io::FormatDriver;

/// Ordered collection of format drivers.
///
/// Order matters for identification: the first driver that recognises a path
/// wins, so more specific formats (`CityJSON`) must precede more general ones
/// (`GeoJSON`).
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn FormatDriver>>,
}

impl DriverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a driver. A driver whose short name is already registered is
    /// ignored, so registration is idempotent.
    pub fn register(&mut self, driver: Arc<dyn FormatDriver>) {
        let name = driver.descriptor().short_name;
        if self.find(name).is_some() {
            debug!("Driver {name} already registered");
            return;
        }
        debug!("Registering driver {name}");
        self.drivers.push(driver);
    }

    /// Finds a driver by short name (case-insensitive).
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Arc<dyn FormatDriver>> {
        self.drivers
            .iter()
            .find(|d| d.descriptor().short_name.eq_ignore_ascii_case(name))
    }

    /// Returns the first driver that identifies `path`.
    #[must_use]
    pub fn identify(&self, path: &Path) -> Option<&Arc<dyn FormatDriver>> {
        self.drivers.iter().find(|d| {
            let hit = d.identify(path);
            debug!(
                "Driver {} {} {}",
                d.descriptor().short_name,
                if hit { "identified" } else { "skipped" },
                path.display()
            );
            hit
        })
    }

    /// Descriptors of all registered drivers, in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<&'static Driver> {
        self.drivers.iter().map(|d| d.descriptor()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.drivers.iter().map(|d| d.descriptor().short_name))
            .finish()
    }
}
