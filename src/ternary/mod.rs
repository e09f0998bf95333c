// Ternary coordinate pipeline.
//
// Raw per-community counts become proportions over three poles (US-like,
// Russia-like, Middle ground), get amplified away from the centre, and are
// aggregated into weighted centroids. Every stage is a pure transform over
// an in-memory table: no I/O, no shared state, no errors. Data-quality
// problems are logged and degrade to well-formed output.

pub mod amplify;
pub mod bubbles;
pub mod centroids;
pub mod colors;
pub mod proportions;

use serde::{Deserialize, Serialize};

use crate::db::models::ItemRecord;

/// Denominators at or below this are treated as zero.
pub const EPSILON: f64 = 1e-9;

/// One of the three ternary poles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bloc {
    Us,
    Russia,
    Middle,
}

impl Bloc {
    pub const ALL: [Bloc; 3] = [Bloc::Us, Bloc::Russia, Bloc::Middle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bloc::Us => "US",
            Bloc::Russia => "Russia",
            Bloc::Middle => "Middle",
        }
    }
}

impl std::fmt::Display for Bloc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A point (or any per-pole triple) in ternary space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ternary {
    pub us: f64,
    pub russia: f64,
    pub middle: f64,
}

impl Ternary {
    /// The geometric centre, also the "no data" position for centroids.
    pub const CENTER: Ternary = Ternary {
        us: 1.0 / 3.0,
        russia: 1.0 / 3.0,
        middle: 1.0 / 3.0,
    };

    pub const ZERO: Ternary = Ternary {
        us: 0.0,
        russia: 0.0,
        middle: 0.0,
    };

    pub fn new(us: f64, russia: f64, middle: f64) -> Self {
        Self { us, russia, middle }
    }

    pub fn get(&self, bloc: Bloc) -> f64 {
        match bloc {
            Bloc::Us => self.us,
            Bloc::Russia => self.russia,
            Bloc::Middle => self.middle,
        }
    }

    pub fn sum(&self) -> f64 {
        self.us + self.russia + self.middle
    }

    pub fn is_finite(&self) -> bool {
        self.us.is_finite() && self.russia.is_finite() && self.middle.is_finite()
    }

    /// Apply `f` to each component.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Ternary {
        Ternary::new(f(self.us), f(self.russia), f(self.middle))
    }

    /// Divide every component by `divisor`.
    pub fn scale(&self, divisor: f64) -> Ternary {
        self.map(|v| v / divisor)
    }
}

/// One row of the working table: the source record plus everything the
/// pipeline derives from it.
///
/// `None` in `proportions` / `amplified` means undefined; those rows are
/// filtered or special-cased downstream, never treated as the centre.
#[derive(Debug, Clone, Serialize)]
pub struct ItemRow {
    pub record: ItemRecord,
    /// Sanitised raw counts per pole
    pub counts: Ternary,
    pub total_mentions: f64,
    pub proportions: Option<Ternary>,
    pub amplified: Option<Ternary>,
    pub size_px: Option<f64>,
}

impl ItemRow {
    pub fn new(record: ItemRecord) -> Self {
        Self {
            record,
            counts: Ternary::ZERO,
            total_mentions: 0.0,
            proportions: None,
            amplified: None,
            size_px: None,
        }
    }
}

/// Coerce a raw weight or count to a usable non-negative number.
///
/// Missing, non-finite and negative values all become zero.
pub fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_sums_to_one() {
        assert!((Ternary::CENTER.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(Some(3.0)), 3.0);
        assert_eq!(non_negative(Some(-2.0)), 0.0);
        assert_eq!(non_negative(Some(f64::NAN)), 0.0);
        assert_eq!(non_negative(Some(f64::INFINITY)), 0.0);
        assert_eq!(non_negative(None), 0.0);
    }

    #[test]
    fn test_get_matches_fields() {
        let t = Ternary::new(0.1, 0.2, 0.7);
        assert_eq!(t.get(Bloc::Us), 0.1);
        assert_eq!(t.get(Bloc::Russia), 0.2);
        assert_eq!(t.get(Bloc::Middle), 0.7);
    }
}
