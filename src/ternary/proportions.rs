// Base ternary attributes: TotalMentions and per-pole proportions.
//
// Two-stage normalisation. Each count is first turned into a relative
// frequency within its pole's corpus-wide total (so a small pole is not
// drowned out by a large one), then the three relative frequencies of an
// item are renormalised to sum to 1.
//
// A pole whose corpus-wide total is zero contributes nothing to any item.
// Items whose relative frequencies sum to zero get undefined proportions,
// even when their raw counts are nonzero.

use serde::Serialize;
use tracing::{info, warn};

use super::{non_negative, Bloc, ItemRow, Ternary, EPSILON};
use crate::db::models::ItemRecord;

/// Which storage columns hold the raw counts for each pole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountColumns {
    pub us: String,
    pub russia: String,
    pub middle: String,
}

impl CountColumns {
    pub fn new(us: &str, russia: &str, middle: &str) -> Self {
        Self {
            us: us.to_string(),
            russia: russia.to_string(),
            middle: middle.to_string(),
        }
    }

    pub fn column(&self, bloc: Bloc) -> &str {
        match bloc {
            Bloc::Us => &self.us,
            Bloc::Russia => &self.russia,
            Bloc::Middle => &self.middle,
        }
    }
}

/// Output of the proportion calculation.
#[derive(Debug, Clone)]
pub struct ProportionTable {
    pub rows: Vec<ItemRow>,
    /// Poles whose corpus-wide total was zero (no global signal)
    pub silent_blocs: Vec<Bloc>,
}

impl ProportionTable {
    /// Number of rows with defined proportions.
    pub fn defined_count(&self) -> usize {
        self.rows.iter().filter(|r| r.proportions.is_some()).count()
    }

    /// Keep only rows with defined proportions.
    pub fn into_defined(self) -> Vec<ItemRow> {
        self.rows
            .into_iter()
            .filter(|r| r.proportions.is_some())
            .collect()
    }
}

/// Compute TotalMentions and proportions for every item.
///
/// Input records are copied; the caller's table is never modified.
pub fn calculate_base_attributes(items: &[ItemRecord], columns: &CountColumns) -> ProportionTable {
    if items.is_empty() {
        warn!("Input item table is empty, cannot calculate base ternary attributes");
        return ProportionTable {
            rows: Vec::new(),
            silent_blocs: Vec::new(),
        };
    }

    for bloc in Bloc::ALL {
        let column = columns.column(bloc);
        if !items.iter().any(|item| item.has_column(column)) {
            warn!(
                bloc = bloc.as_str(),
                column, "Count column not found in any item, treating as zeros"
            );
        }
    }

    let mut rows: Vec<ItemRow> = items
        .iter()
        .map(|item| {
            let counts = Ternary::new(
                non_negative(item.number(&columns.us)),
                non_negative(item.number(&columns.russia)),
                non_negative(item.number(&columns.middle)),
            );
            let mut row = ItemRow::new(item.clone());
            row.counts = counts;
            row.total_mentions = counts.sum();
            row
        })
        .collect();

    let totals = Ternary::new(
        rows.iter().map(|r| r.counts.us).sum(),
        rows.iter().map(|r| r.counts.russia).sum(),
        rows.iter().map(|r| r.counts.middle).sum(),
    );

    let mut silent_blocs = Vec::new();
    for bloc in Bloc::ALL {
        if totals.get(bloc) <= 0.0 {
            warn!(
                bloc = bloc.as_str(),
                column = columns.column(bloc),
                "Corpus-wide total is 0, relative frequencies for this bloc will be 0"
            );
            silent_blocs.push(bloc);
        }
    }

    let relative = |count: f64, total: f64| if total > 0.0 { count / total } else { 0.0 };

    for row in &mut rows {
        let r = Ternary::new(
            relative(row.counts.us, totals.us),
            relative(row.counts.russia, totals.russia),
            relative(row.counts.middle, totals.middle),
        );
        let r_sum = r.sum();
        row.proportions = if r_sum > EPSILON {
            Some(r.scale(r_sum))
        } else {
            None
        };
    }

    let table = ProportionTable { rows, silent_blocs };
    info!(
        items = table.rows.len(),
        defined = table.defined_count(),
        "Calculated base ternary attributes"
    );
    table
}
