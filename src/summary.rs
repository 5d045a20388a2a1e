//! Terminal rendering of the trending leaderboard.
//!
//! The table is driven by a column specification (key, header label,
//! compact-visibility hint) kept separate from the row data, so the compact
//! and full variants share one renderer.

use crate::trending::{ChangeIndicator, FormattedRow, Period, SortMetric};
use chrono::{DateTime, Local};
use colored::Colorize;
use std::path::Path;

const COMPACT_ROW_LIMIT: usize = 10;
const MAX_TITLE_WIDTH: usize = 28;

#[derive(Clone, Copy, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

pub struct Column {
    pub key: &'static str,
    pub label: String,
    pub align: Align,
    /// Whether the column survives into the compact (default) table.
    pub compact: bool,
}

/// Column specification for the selected window. Header labels carry the
/// period so "24h USD Volume" becomes "7d USD Volume" and so on.
pub fn table_columns(period: Period) -> Vec<Column> {
    let window = period.label();
    vec![
        Column {
            key: "pos",
            label: "Pos".to_string(),
            align: Align::Right,
            compact: true,
        },
        Column {
            key: "collection",
            label: "Collection".to_string(),
            align: Align::Left,
            compact: true,
        },
        Column {
            key: "sales",
            label: "Sales".to_string(),
            align: Align::Right,
            compact: true,
        },
        Column {
            key: "sales_change",
            label: "Δ Sales".to_string(),
            align: Align::Right,
            compact: false,
        },
        Column {
            key: "usd_volume",
            label: format!("{window} USD Volume"),
            align: Align::Right,
            compact: true,
        },
        Column {
            key: "usd_volume_change",
            label: "Δ USD".to_string(),
            align: Align::Right,
            compact: true,
        },
        Column {
            key: "volume",
            label: format!("{window} SUI Volume"),
            align: Align::Right,
            compact: false,
        },
        Column {
            key: "volume_change",
            label: "Δ SUI".to_string(),
            align: Align::Right,
            compact: false,
        },
        Column {
            key: "floor",
            label: "Floor".to_string(),
            align: Align::Right,
            compact: true,
        },
    ]
}

pub struct SummaryPaths<'a> {
    pub(crate) csv: Option<&'a Path>,
    pub(crate) html: Option<&'a Path>,
}

pub struct SummaryContext<'a> {
    pub(crate) collection_count: usize,
    pub(crate) period: Period,
    pub(crate) sort_by: SortMetric,
    pub(crate) run_started_at: &'a DateTime<Local>,
    pub(crate) paths: SummaryPaths<'a>,
    pub(crate) rows: &'a [FormattedRow],
    pub(crate) full_output: bool,
}

pub fn print_summary(context: &SummaryContext<'_>) {
    println!();
    print_summary_header(context);
    print_summary_paths(&context.paths);
    println!();
    println!(
        "{}",
        format!("Trending Collections ({})", context.period.label())
            .bold()
            .bright_magenta()
    );
    let table_width = print_trending_table(context);
    if table_width > 0 {
        println!("{}", "=".repeat(table_width).bright_cyan());
    }
}

fn print_summary_header(context: &SummaryContext<'_>) {
    println!(
        "{}",
        "====================== SuiRank Update ======================"
            .bold()
            .bright_cyan()
    );
    println!(
        "{} {}",
        "Run started".bright_yellow().bold(),
        context
            .run_started_at
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string()
            .bright_white()
    );
    println!(
        "{} {} | {} | {}",
        "Query".bright_yellow().bold(),
        format!("Collections: {}", context.collection_count).bright_white(),
        format!("Window: {}", context.period.label()).bright_white(),
        format!("Order: {} desc", context.sort_by.order_by_field()).bright_white()
    );
}

fn print_summary_paths(paths: &SummaryPaths<'_>) {
    print_path_line("Trending CSV", paths.csv, "not saved (use --save-csv)");
    print_path_line("HTML Report", paths.html, "not saved (use --save-html)");
}

fn print_path_line(label: &str, path: Option<&Path>, hint: &str) {
    let label_colored = label.bright_yellow().bold();
    match path {
        Some(path) => println!(
            "{} {}",
            label_colored,
            format!("{}", path.display()).bright_white()
        ),
        None => println!("{} {}", label_colored, hint.bright_black()),
    }
}

fn print_trending_table(context: &SummaryContext<'_>) -> usize {
    if context.rows.is_empty() {
        let message = "No trending data available.";
        println!("{}", message.bright_black());
        return message.len();
    }

    let columns: Vec<Column> = table_columns(context.period)
        .into_iter()
        .filter(|column| context.full_output || column.compact)
        .collect();
    let shown = if context.full_output {
        context.rows.len()
    } else {
        context.rows.len().min(COMPACT_ROW_LIMIT)
    };

    let cells: Vec<Vec<String>> = context.rows[..shown]
        .iter()
        .map(|row| columns.iter().map(|column| cell_text(row, column.key)).collect())
        .collect();
    let widths = column_widths(&columns, &cells);

    let header = render_line(&columns, &widths, |idx| columns[idx].label.clone());
    let separator = widths
        .iter()
        .map(|width| "-".repeat(width + 2))
        .collect::<Vec<_>>()
        .join("+");
    let mut max_width = header.chars().count().max(separator.len());
    println!("{}", header.bold().bright_white());
    println!("{}", separator.bright_black());

    for row_cells in &cells {
        let line = render_line(&columns, &widths, |idx| row_cells[idx].clone());
        max_width = max_width.max(line.chars().count());
        println!("{}", line.bright_green());
    }

    if !context.full_output && context.rows.len() > shown {
        let message = format!(
            "... {} more collections (use --full-output to display all).",
            context.rows.len() - shown
        );
        max_width = max_width.max(message.len());
        println!("{}", message.bright_black());
    }

    max_width
}

fn cell_text(row: &FormattedRow, key: &str) -> String {
    let change_cell = |indicator: &Option<ChangeIndicator>| {
        indicator
            .as_ref()
            .map_or_else(|| "-".to_string(), ChangeIndicator::signed_text)
    };
    match key {
        "pos" => row.position.to_string(),
        "collection" => {
            let title = truncate_title(&row.title);
            if row.verified {
                format!("{title} ✓")
            } else {
                title
            }
        }
        "sales" => placeholder_if_empty(&row.trades),
        "sales_change" => change_cell(&row.trades_change),
        "usd_volume" => placeholder_if_empty(&row.usd_volume),
        "usd_volume_change" => change_cell(&row.usd_volume_change),
        "volume" => placeholder_if_empty(&row.volume),
        "volume_change" => change_cell(&row.volume_change),
        "floor" => placeholder_if_empty(&row.floor),
        _ => String::new(),
    }
}

fn placeholder_if_empty(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_WIDTH {
        return title.to_string();
    }
    let kept: String = title.chars().take(MAX_TITLE_WIDTH - 1).collect();
    format!("{}…", kept.trim_end())
}

fn column_widths(columns: &[Column], cells: &[Vec<String>]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            cells
                .iter()
                .map(|row| row[idx].chars().count())
                .max()
                .unwrap_or(0)
                .max(column.label.chars().count())
        })
        .collect()
}

fn render_line<F>(columns: &[Column], widths: &[usize], cell: F) -> String
where
    F: Fn(usize) -> String,
{
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let text = cell(idx);
            let pad = widths[idx].saturating_sub(text.chars().count());
            match column.align {
                Align::Left => format!("{text}{}", " ".repeat(pad)),
                Align::Right => format!("{}{text}", " ".repeat(pad)),
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trending::{CollectionSnapshot, build_rows};

    fn sample_rows() -> Vec<FormattedRow> {
        build_rows(&[CollectionSnapshot {
            id: "0xaa".to_string(),
            title: "Fuddies".to_string(),
            cover_url: String::new(),
            verified: true,
            floor: None,
            current_trades_count: 321.0,
            previous_trades_count: 300.0,
            current_usd_volume: 1_234_567.0,
            previous_usd_volume: 1_000_000.0,
            current_volume: 52_000.0,
            previous_volume: 0.0,
        }])
    }

    #[test]
    fn column_spec_reflects_period_and_visibility() {
        let columns = table_columns(Period::Days7);
        let usd = columns
            .iter()
            .find(|column| column.key == "usd_volume")
            .unwrap();
        assert_eq!(usd.label, "7d USD Volume");
        assert!(usd.compact);
        let native_change = columns
            .iter()
            .find(|column| column.key == "volume_change")
            .unwrap();
        assert!(!native_change.compact);
    }

    #[test]
    fn cells_render_placeholders_for_suppressed_values() {
        let rows = sample_rows();
        let row = &rows[0];
        assert_eq!(cell_text(row, "collection"), "Fuddies ✓");
        assert_eq!(cell_text(row, "usd_volume"), "$1,234,567");
        assert_eq!(cell_text(row, "usd_volume_change"), "+23.46%");
        // previous volume of 0 suppresses the indicator, floor is absent
        assert_eq!(cell_text(row, "volume_change"), "-");
        assert_eq!(cell_text(row, "floor"), "-");
    }

    #[test]
    fn long_titles_are_truncated() {
        let truncated = truncate_title("An Exceptionally Long Collection Name Indeed");
        assert!(truncated.chars().count() <= MAX_TITLE_WIDTH);
        assert!(truncated.ends_with('…'));
    }
}
