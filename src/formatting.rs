//! Presentation-only number formatting for leaderboard cells.

/// Scales a non-negative quantity by powers of 1000 and renders it with two
/// decimal places once scaled, or none below 1000. The unit (K/M/B) is left
/// to the column context; see [`magnitude_suffix`].
///
/// Missing or non-numeric input renders as an empty string so sparse fields
/// (floor price, volumes of fresh collections) never error upstream.
pub fn format_magnitude(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => match magnitude_scale(v) {
            Some((divisor, _)) => format!("{:.2}", v / divisor),
            None => format!("{v:.0}"),
        },
        _ => String::new(),
    }
}

/// Unit implied by the scaling [`format_magnitude`] applied.
pub fn magnitude_suffix(value: Option<f64>) -> &'static str {
    match value {
        Some(v) if v.is_finite() => magnitude_scale(v).map_or("", |(_, suffix)| suffix),
        _ => "",
    }
}

/// Scale boundaries sit where the rendered digits would roll over to 1000,
/// so `999.7` reads `1.00K` rather than an unsuffixed `1000` next to a
/// marginally larger `1.00K` cell.
fn magnitude_scale(value: f64) -> Option<(f64, &'static str)> {
    if value >= 999_995_000.0 {
        Some((1_000_000_000.0, "B"))
    } else if value >= 999_995.0 {
        Some((1_000_000.0, "M"))
    } else if value >= 999.5 {
        Some((1_000.0, "K"))
    } else {
        None
    }
}

/// [`format_magnitude`] with its unit attached, for single-cell use.
pub fn format_magnitude_cell(value: Option<f64>) -> String {
    let scaled = format_magnitude(value);
    if scaled.is_empty() {
        scaled
    } else {
        format!("{scaled}{}", magnitude_suffix(value))
    }
}

/// Renders USD with zero fractional digits, truncating (not rounding) the
/// input first: `1234.99` becomes `$1,234`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let truncated = value.floor();
    if truncated < 0.0 {
        format!("-${}", group_digits(truncated.abs() as u64))
    } else {
        format!("${}", group_digits(truncated as u64))
    }
}

/// Whole-number display with thousands grouping, used for trade counts.
pub fn format_count(value: f64) -> String {
    if !value.is_finite() || value < 0.0 {
        return String::new();
    }
    group_digits(value.floor() as u64)
}

fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_scales_by_powers_of_1000() {
        assert_eq!(format_magnitude(Some(0.0)), "0");
        assert_eq!(format_magnitude(Some(999.0)), "999");
        assert_eq!(format_magnitude(Some(1500.0)), "1.50");
        assert_eq!(format_magnitude(Some(2_500_000.0)), "2.50");
        assert_eq!(format_magnitude(Some(3_250_000_000.0)), "3.25");
    }

    #[test]
    fn magnitude_guards_missing_input() {
        assert_eq!(format_magnitude(None), "");
        assert_eq!(format_magnitude(Some(f64::NAN)), "");
        assert_eq!(format_magnitude(Some(f64::INFINITY)), "");
    }

    #[test]
    fn magnitude_suffix_matches_scaling() {
        assert_eq!(magnitude_suffix(Some(500.0)), "");
        assert_eq!(magnitude_suffix(Some(1500.0)), "K");
        assert_eq!(magnitude_suffix(Some(2_500_000.0)), "M");
        assert_eq!(magnitude_suffix(Some(7_000_000_000.0)), "B");
        assert_eq!(magnitude_suffix(None), "");
    }

    #[test]
    fn magnitude_rescales_at_rounding_boundaries() {
        assert_eq!(format_magnitude_cell(Some(999.7)), "1.00K");
        assert_eq!(format_magnitude(Some(999.4)), "999");
        assert_eq!(format_magnitude_cell(Some(999_994.0)), "999.99K");
        assert_eq!(format_magnitude_cell(Some(999_996.0)), "1.00M");
        assert_eq!(format_magnitude_cell(Some(999_996_000.0)), "1.00B");
    }

    #[test]
    fn magnitude_cell_attaches_unit() {
        assert_eq!(format_magnitude_cell(Some(1500.0)), "1.50K");
        assert_eq!(format_magnitude_cell(Some(42.0)), "42");
        assert_eq!(format_magnitude_cell(None), "");
    }

    #[test]
    fn currency_floors_before_formatting() {
        assert_eq!(format_currency(1234.99), "$1,234");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
        assert_eq!(format_currency(-10.5), "-$11");
    }

    #[test]
    fn count_groups_digits() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(9_431.0), "9,431");
        assert_eq!(format_count(1_234_567.0), "1,234,567");
        assert_eq!(format_count(f64::NAN), "");
    }
}
