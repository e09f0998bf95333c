// Bubble sizing for the item plot.
//
// TotalMentions spans several orders of magnitude, so sizes are driven by
// ln(TotalMentions) raised to a scaling power, then min-max normalised into
// the configured pixel range.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ItemRow;

/// Pixel range and curve for bubble sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleSizing {
    pub min_size: f64,
    pub max_size: f64,
    pub scaling_power: f64,
}

impl BubbleSizing {
    /// Clamp raw control values into a usable range: sizes are at least 1px,
    /// the max is above the min, and the curve power stays positive.
    pub fn clamped(min_size: f64, max_size: f64, scaling_power: f64) -> Self {
        let min_size = if min_size.is_finite() && min_size > 0.0 {
            min_size
        } else {
            1.0
        };
        let max_size = if max_size.is_finite() && max_size >= min_size {
            max_size
        } else {
            min_size + 1.0
        };
        let scaling_power = if scaling_power.is_finite() {
            scaling_power.clamp(0.1, 5.0)
        } else {
            1.0
        };
        Self {
            min_size,
            max_size,
            scaling_power,
        }
    }
}

impl Default for BubbleSizing {
    fn default() -> Self {
        Self {
            min_size: 1.0,
            max_size: 75.0,
            scaling_power: 3.0,
        }
    }
}

/// Set `size_px` on every row, preserving row order.
pub fn size_bubbles(rows: &mut [ItemRow], sizing: &BubbleSizing) {
    let power = if sizing.scaling_power.is_finite() && sizing.scaling_power > 0.0 {
        sizing.scaling_power
    } else {
        warn!(
            scaling_power = sizing.scaling_power,
            "Invalid bubble scaling power, using 1.0"
        );
        1.0
    };

    let sizable = |tm: f64| tm.is_finite() && tm > 0.0;
    let scaled: Vec<Option<f64>> = rows
        .iter()
        .map(|r| {
            sizable(r.total_mentions).then(|| r.total_mentions.max(1.0).ln().powf(power))
        })
        .collect();

    let values: Vec<f64> = scaled.iter().flatten().copied().collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let degenerate = !min.is_finite() || !max.is_finite() || min == max;
    let flat_value = if values.len() > 1 { 0.5 } else { 0.0 };

    let span = sizing.max_size - sizing.min_size;
    for (row, v) in rows.iter_mut().zip(scaled) {
        row.size_px = Some(match v {
            Some(v) => {
                let norm = if degenerate {
                    flat_value
                } else {
                    (v - min) / (max - min)
                };
                sizing.min_size + norm * span
            }
            None => sizing.min_size,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ItemRecord;

    fn row(tm: f64) -> ItemRow {
        let mut row = ItemRow::new(ItemRecord::new(1, "x"));
        row.total_mentions = tm;
        row
    }

    fn sizing() -> BubbleSizing {
        BubbleSizing {
            min_size: 4.0,
            max_size: 40.0,
            scaling_power: 2.0,
        }
    }

    #[test]
    fn test_zero_mentions_get_min_size() {
        let mut rows = vec![row(0.0)];
        size_bubbles(&mut rows, &sizing());
        assert_eq!(rows[0].size_px, Some(4.0));
    }

    #[test]
    fn test_identical_mentions_get_midpoint() {
        let mut rows = vec![row(50.0), row(50.0), row(50.0)];
        size_bubbles(&mut rows, &sizing());
        for r in &rows {
            assert_eq!(r.size_px, Some(22.0));
        }
    }

    #[test]
    fn test_single_positive_row_gets_min_size() {
        let mut rows = vec![row(50.0), row(0.0)];
        size_bubbles(&mut rows, &sizing());
        assert_eq!(rows[0].size_px, Some(4.0));
        assert_eq!(rows[1].size_px, Some(4.0));
    }

    #[test]
    fn test_extremes_span_range_in_order() {
        let mut rows = vec![row(1000.0), row(0.0), row(10.0), row(100.0)];
        size_bubbles(&mut rows, &sizing());
        assert_eq!(rows[0].size_px, Some(40.0));
        assert_eq!(rows[1].size_px, Some(4.0));
        assert_eq!(rows[2].size_px, Some(4.0));
        let mid = rows[3].size_px.unwrap();
        // ln(100)^2 sits 3/8 of the way from ln(10)^2 to ln(1000)^2
        let expected = 4.0 + (4.0 - 1.0) / (9.0 - 1.0) * 36.0;
        assert!((mid - expected).abs() < 1e-9, "got {mid}");
    }

    #[test]
    fn test_fractional_mentions_clip_to_log_one() {
        // 0.5 is positive, so it joins the sized subset at ln(1) = 0
        let mut rows = vec![row(0.5), row(std::f64::consts::E)];
        size_bubbles(&mut rows, &sizing());
        assert_eq!(rows[0].size_px, Some(4.0));
        assert_eq!(rows[1].size_px, Some(40.0));
    }

    #[test]
    fn test_clamped_controls() {
        let s = BubbleSizing::clamped(0.0, -3.0, 9.0);
        assert_eq!(s.min_size, 1.0);
        assert_eq!(s.max_size, 2.0);
        assert_eq!(s.scaling_power, 5.0);
    }
}
