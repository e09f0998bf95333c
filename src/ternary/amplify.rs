// Power-law amplification of ternary proportions.
//
// Raising each proportion to a power k and renormalising pushes points away
// from the centre: k = 1 is the identity, k > 1 exaggerates an item's
// leaning toward its dominant pole.

use tracing::{info, warn};

use super::{ItemRow, Ternary, EPSILON};

/// Amplify a single proportion triple.
///
/// When every powered component is ~0 the original proportions are
/// returned unchanged instead of dividing by zero.
pub fn amplify_point(p: Ternary, power: f64) -> Ternary {
    let primed = p.map(|v| v.powf(power));
    let sum = primed.sum();
    if sum > EPSILON {
        primed.scale(sum)
    } else {
        p
    }
}

/// Set `amplified` on every row, preserving row order.
///
/// Rows without usable proportions get `None`.
pub fn amplify(rows: &mut [ItemRow], power: f64) {
    let power = if power.is_finite() && power >= 0.0 {
        power
    } else {
        warn!(power, "Invalid amplification power, using identity (1.0)");
        1.0
    };

    let mut amplified = 0usize;
    for row in rows.iter_mut() {
        row.amplified = match row.proportions {
            Some(p) if p.is_finite() => {
                amplified += 1;
                Some(amplify_point(p, power))
            }
            _ => None,
        };
    }

    if amplified == 0 && !rows.is_empty() {
        info!("No rows with valid proportions found for amplification");
    }
    info!(rows = rows.len(), amplified, power, "Calculated amplified coordinates");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ItemRecord;

    fn row_with(p: Option<Ternary>) -> ItemRow {
        let mut row = ItemRow::new(ItemRecord::new(1, "x"));
        row.proportions = p;
        row
    }

    #[test]
    fn test_power_one_is_identity() {
        let p = Ternary::new(0.2, 0.3, 0.5);
        let a = amplify_point(p, 1.0);
        assert!((a.us - 0.2).abs() < 1e-12);
        assert!((a.russia - 0.3).abs() < 1e-12);
        assert!((a.middle - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_power_two() {
        // squares: 0.04, 0.09, 0.25 -> sum 0.38
        let a = amplify_point(Ternary::new(0.2, 0.3, 0.5), 2.0);
        assert!((a.us - 0.04 / 0.38).abs() < 1e-12);
        assert!((a.middle - 0.25 / 0.38).abs() < 1e-12);
        assert!((a.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_proportions_fall_back() {
        let a = amplify_point(Ternary::ZERO, 2.5);
        assert_eq!(a, Ternary::ZERO);
    }

    #[test]
    fn test_power_zero_flattens_to_center() {
        // 0^0 = 1 in IEEE, so every component becomes 1 before renormalising
        let a = amplify_point(Ternary::new(1.0, 0.0, 0.0), 0.0);
        assert!((a.us - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_rows_stay_undefined() {
        let mut rows = vec![
            row_with(Some(Ternary::new(0.6, 0.2, 0.2))),
            row_with(None),
            row_with(Some(Ternary::new(f64::NAN, 0.5, 0.5))),
        ];
        amplify(&mut rows, 2.0);
        assert!(rows[0].amplified.is_some());
        assert!(rows[1].amplified.is_none());
        assert!(rows[2].amplified.is_none());
    }

    #[test]
    fn test_negative_power_uses_identity() {
        let mut rows = vec![row_with(Some(Ternary::new(0.6, 0.2, 0.2)))];
        amplify(&mut rows, -1.0);
        let a = rows[0].amplified.unwrap();
        assert!((a.us - 0.6).abs() < 1e-12);
        assert!((a.middle - 0.2).abs() < 1e-12);
    }
}
