//! Axis-aligned bounding envelopes and their incremental construction.

use std::fmt;

use geozero::GeomProcessor;
use serde::Serialize;

/// Axis-aligned bounding box of a layer, in the layer's own coordinates.
///
/// Invariant: `min_x <= max_x` and `min_y <= max_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Builds an envelope from two corners given in any order.
    #[must_use]
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Degenerate envelope covering a single coordinate.
    #[must_use]
    pub fn from_point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    /// Grows the envelope to contain `(x, y)`.
    pub fn expand_to(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Exports the envelope as a closed WKT polygon, counter-clockwise from
    /// the lower-left corner.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        let Envelope {
            min_x,
            min_y,
            max_x,
            max_y,
        } = *self;
        format!(
            "POLYGON (({min_x} {min_y},{max_x} {min_y},{max_x} {max_y},{min_x} {max_y},{min_x} {min_y}))"
        )
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Accumulates an [`Envelope`] from coordinates as they stream past.
///
/// Implements [`GeomProcessor`], so any `geozero` geometry source (WKT, WKB,
/// `geo-types`) can be fed straight into it. Non-finite coordinates are
/// ignored.
#[derive(Debug, Default, Clone)]
pub struct EnvelopeBuilder {
    envelope: Option<Envelope>,
}

impl EnvelopeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        match &mut self.envelope {
            Some(envelope) => envelope.expand_to(x, y),
            None => self.envelope = Some(Envelope::from_point(x, y)),
        }
    }

    /// Returns the envelope seen so far, or `None` if nothing was added.
    #[must_use]
    pub fn finish(self) -> Option<Envelope> {
        self.envelope
    }
}

impl GeomProcessor for EnvelopeBuilder {
    fn xy(&mut self, x: f64, y: f64, _idx: usize) -> geozero::error::Result<()> {
        self.add_point(x, y);
        Ok(())
    }
}
