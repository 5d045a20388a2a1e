//! Core trending model: snapshot records and the pure snapshot-to-row
//! derivation that computes and classifies percentage changes.

use clap::ValueEnum;

use crate::formatting::{format_count, format_currency, format_magnitude_cell};

/// Comparison window the indexer resolves current/previous pairs over.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Period {
    #[value(name = "1d")]
    Days1,
    #[value(name = "7d")]
    Days7,
    #[value(name = "14d")]
    Days14,
    #[value(name = "30d")]
    Days30,
}

impl Period {
    /// Value of the `period` GraphQL variable.
    pub const fn query_value(self) -> &'static str {
        match self {
            Self::Days1 => "days_1",
            Self::Days7 => "days_7",
            Self::Days14 => "days_14",
            Self::Days30 => "days_30",
        }
    }

    /// Short label used in column headers ("24h USD Volume" etc).
    pub const fn label(self) -> &'static str {
        match self {
            Self::Days1 => "24h",
            Self::Days7 => "7d",
            Self::Days14 => "14d",
            Self::Days30 => "30d",
        }
    }
}

/// Metric the indexer is asked to order collections by (descending).
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum SortMetric {
    UsdVolume,
    Volume,
    Trades,
    Floor,
}

impl SortMetric {
    pub const fn order_by_field(self) -> &'static str {
        match self {
            Self::UsdVolume => "usd_volume",
            Self::Volume => "volume",
            Self::Trades => "trades_count",
            Self::Floor => "floor",
        }
    }
}

/// One collection's metrics for the selected window, as validated at the
/// transport boundary. Current/previous pairs feed the change derivation;
/// a missing previous value deserializes to 0 and suppresses the indicator.
#[derive(Debug, Clone)]
pub struct CollectionSnapshot {
    pub id: String,
    pub title: String,
    pub cover_url: String,
    pub verified: bool,
    pub floor: Option<f64>,
    pub current_trades_count: f64,
    pub previous_trades_count: f64,
    pub current_usd_volume: f64,
    pub previous_usd_volume: f64,
    pub current_volume: f64,
    pub previous_volume: f64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ChangeDirection {
    Increase,
    Decrease,
}

/// Styling-only classification of a percentage change.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChangeIndicator {
    pub direction: ChangeDirection,
    pub text: String,
}

impl ChangeIndicator {
    /// Cell text with an explicit sign, e.g. `+23.46%` / `-5.00%`.
    pub fn signed_text(&self) -> String {
        match self.direction {
            ChangeDirection::Increase => format!("+{}", self.text),
            ChangeDirection::Decrease => self.text.clone(),
        }
    }
}

/// Display-ready leaderboard row. Derived, never persisted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FormattedRow {
    pub position: usize,
    pub title: String,
    pub cover_url: String,
    pub verified: bool,
    pub trades: String,
    pub trades_change: Option<ChangeIndicator>,
    pub usd_volume: String,
    pub usd_volume_change: Option<ChangeIndicator>,
    pub volume: String,
    pub volume_change: Option<ChangeIndicator>,
    pub floor: String,
}

/// Plain percentage delta. Deliberately not guarded: a zero `previous`
/// yields a non-finite result that [`change_indicator`] suppresses.
pub fn compute_change(current: f64, previous: f64) -> f64 {
    ((current - previous) / previous) * 100.0
}

/// Classifies a finite percentage for display. Direction tracks the raw
/// sign (a negative zero counts as an increase); only the text collapses
/// exact zero so it never renders with a minus sign.
pub fn classify_change(percentage: f64) -> ChangeIndicator {
    let direction = if percentage >= 0.0 {
        ChangeDirection::Increase
    } else {
        ChangeDirection::Decrease
    };
    let text_value = if percentage == 0.0 { 0.0 } else { percentage };
    ChangeIndicator {
        direction,
        text: format!("{text_value:.2}%"),
    }
}

/// Change indicator for one metric pair, or `None` when `previous` is zero
/// or not a finite number. Suppression here is the single choke point that
/// keeps `inf%`/`NaN%` out of every render path.
pub fn change_indicator(current: f64, previous: f64) -> Option<ChangeIndicator> {
    let percentage = compute_change(current, previous);
    if percentage.is_finite() {
        Some(classify_change(percentage))
    } else {
        None
    }
}

/// Derives display rows from snapshots, preserving the indexer's order.
/// Pure: no I/O, no shared state, same input gives identical output.
pub fn build_rows(snapshots: &[CollectionSnapshot]) -> Vec<FormattedRow> {
    snapshots
        .iter()
        .enumerate()
        .map(|(idx, snapshot)| FormattedRow {
            position: idx + 1,
            title: snapshot.title.clone(),
            cover_url: snapshot.cover_url.clone(),
            verified: snapshot.verified,
            trades: format_count(snapshot.current_trades_count),
            trades_change: change_indicator(
                snapshot.current_trades_count,
                snapshot.previous_trades_count,
            ),
            usd_volume: format_currency(snapshot.current_usd_volume),
            usd_volume_change: change_indicator(
                snapshot.current_usd_volume,
                snapshot.previous_usd_volume,
            ),
            volume: format_magnitude_cell(Some(snapshot.current_volume)),
            volume_change: change_indicator(snapshot.current_volume, snapshot.previous_volume),
            floor: format_magnitude_cell(snapshot.floor),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(current_usd: f64, previous_usd: f64) -> CollectionSnapshot {
        CollectionSnapshot {
            id: "0xabc".to_string(),
            title: "Fuddies".to_string(),
            cover_url: "https://img.example/fuddies.png".to_string(),
            verified: true,
            floor: Some(149.5),
            current_trades_count: 321.0,
            previous_trades_count: 300.0,
            current_usd_volume: current_usd,
            previous_usd_volume: previous_usd,
            current_volume: 52_000.0,
            previous_volume: 65_000.0,
        }
    }

    #[test]
    fn change_is_percentage_of_previous() {
        assert!((compute_change(150.0, 100.0) - 50.0).abs() < f64::EPSILON);
        assert!((compute_change(50.0, 100.0) + 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_previous_is_suppressed_not_rendered() {
        assert!(!compute_change(10.0, 0.0).is_finite());
        assert_eq!(change_indicator(10.0, 0.0), None);
        assert_eq!(change_indicator(0.0, 0.0), None);
        assert_eq!(change_indicator(10.0, f64::NAN), None);
    }

    #[test]
    fn classification_direction_follows_sign() {
        for (current, previous) in [(150.0, 100.0), (100.0, 100.0), (1.0, 3.0), (0.0, 5.0)] {
            let percentage = compute_change(current, previous);
            let classified = classify_change(percentage);
            let expected = if percentage >= 0.0 {
                ChangeDirection::Increase
            } else {
                ChangeDirection::Decrease
            };
            assert_eq!(classified.direction, expected);
        }
    }

    #[test]
    fn classification_text_has_two_decimals() {
        let up = classify_change(23.456);
        assert_eq!(up.text, "23.46%");
        assert_eq!(up.signed_text(), "+23.46%");

        let down = classify_change(-50.0);
        assert_eq!(down.text, "-50.00%");
        assert_eq!(down.signed_text(), "-50.00%");
    }

    #[test]
    fn tiny_negative_changes_stay_decreases() {
        let percentage = compute_change(99.996, 100.0);
        assert!(percentage < 0.0);
        let classified = classify_change(percentage);
        assert_eq!(classified.direction, ChangeDirection::Decrease);
        assert_eq!(classified.text, "-0.00%");
        assert_eq!(
            classify_change(-0.004).direction,
            ChangeDirection::Decrease
        );
        assert_eq!(classify_change(0.004).direction, ChangeDirection::Increase);
    }

    #[test]
    fn negative_zero_classifies_as_flat_increase() {
        let flat = classify_change(-0.0);
        assert_eq!(flat.direction, ChangeDirection::Increase);
        assert_eq!(flat.signed_text(), "+0.00%");
    }

    #[test]
    fn rows_carry_formatted_metrics_and_indicators() {
        let rows = build_rows(&[snapshot(1_234_567.0, 1_000_000.0)]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.position, 1);
        assert_eq!(row.usd_volume, "$1,234,567");
        let change = row.usd_volume_change.as_ref().unwrap();
        assert_eq!(change.direction, ChangeDirection::Increase);
        assert_eq!(change.signed_text(), "+23.46%");
        assert_eq!(row.trades, "321");
        assert_eq!(row.volume, "52.00K");
        assert_eq!(row.floor, "150");
    }

    #[test]
    fn row_without_previous_volume_still_renders() {
        let mut snap = snapshot(500.0, 0.0);
        snap.floor = None;
        let rows = build_rows(&[snap]);
        let row = &rows[0];
        assert_eq!(row.usd_volume, "$500");
        assert_eq!(row.usd_volume_change, None);
        assert_eq!(row.floor, "");
    }

    #[test]
    fn derivation_is_pure() {
        let snapshots = vec![snapshot(10.0, 20.0), snapshot(9.0, 0.0)];
        assert_eq!(build_rows(&snapshots), build_rows(&snapshots));
    }
}
