use crate::summary::table_columns;
use crate::trending::{ChangeDirection, ChangeIndicator, FormattedRow, Period, SortMetric};
use crate::write_output_file;
use anyhow::Result;
use chrono::{DateTime, Local};
use std::path::Path;

pub struct HtmlReportPaths<'a> {
    pub(crate) csv: Option<&'a Path>,
}

pub struct HtmlReportContext<'a> {
    pub(crate) period: Period,
    pub(crate) sort_by: SortMetric,
    pub(crate) run_started_at: &'a DateTime<Local>,
    pub(crate) rows: &'a [FormattedRow],
    pub(crate) full_output: bool,
    pub(crate) paths: HtmlReportPaths<'a>,
    pub(crate) output_path: &'a Path,
}

const COMPACT_ROW_LIMIT: usize = 10;

pub async fn save_html_report(output_path: &Path, context: &HtmlReportContext<'_>) -> Result<()> {
    let html = render_html_report(context);
    write_output_file(output_path, html.as_bytes()).await
}

fn render_html_report(context: &HtmlReportContext<'_>) -> String {
    let generated_at = context
        .run_started_at
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string();
    let total = context.rows.len();
    let top_n = total.min(COMPACT_ROW_LIMIT);
    let shown = if context.full_output { total } else { top_n };
    let showing = if context.full_output {
        format!("Showing all {total} collections")
    } else {
        format!("Showing top {top_n} of {total} collections")
    };
    let title = format!(
        "SuiRank Report - {}",
        context.run_started_at.format("%Y-%m-%d")
    );

    let mut html = String::new();
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&title)));
    html.push_str("<meta name=\"color-scheme\" content=\"light\">\n");
    html.push_str("<style>\n");
    html.push_str(REPORT_STYLE);
    html.push_str("\n</style>\n</head>\n<body>\n");
    html.push_str("<div class=\"page\">\n");
    html.push_str("<header class=\"hero\">\n");
    html.push_str(&format!(
        "<div class=\"pill\">SuiRank v{}</div>\n",
        env!("CARGO_PKG_VERSION")
    ));
    html.push_str("<h1>Trending Collections</h1>\n");
    html.push_str(&format!(
        "<p class=\"subtitle\">Sui NFT collections ranked by {} over the last {} window.</p>\n",
        escape_html(context.sort_by.order_by_field()),
        context.period.label()
    ));
    html.push_str("<div class=\"meta\">\n");
    html.push_str(&format!(
        "<div><span class=\"label\">Generated</span><span class=\"value mono\">{}</span></div>\n",
        escape_html(&generated_at)
    ));
    html.push_str(&format!(
        "<div><span class=\"label\">Coverage</span><span class=\"value mono\">{}</span></div>\n",
        escape_html(&showing)
    ));
    html.push_str("</div>\n");
    html.push_str("</header>\n");

    html.push_str("<section class=\"cards\">\n");
    html.push_str(&format!(
        "<div class=\"card\"><div class=\"card-label\">Collections</div><div class=\"card-value\">{total}</div></div>\n"
    ));
    html.push_str(&format!(
        "<div class=\"card\"><div class=\"card-label\">Window</div><div class=\"card-value\">{}</div></div>\n",
        context.period.label()
    ));
    html.push_str(&format!(
        "<div class=\"card\"><div class=\"card-label\">Verified</div><div class=\"card-value\">{}</div></div>\n",
        context.rows.iter().filter(|row| row.verified).count()
    ));
    html.push_str("</section>\n");

    html.push_str("<section class=\"table-section\">\n");
    html.push_str("<h2>Leaderboard</h2>\n");
    if !context.full_output {
        html.push_str(
            "<div class=\"hint\">Run with --full-output to include the full table.</div>\n",
        );
    }
    html.push_str("<div class=\"table-wrap\">\n<table>\n");
    html.push_str(&render_table_header(context.period));
    html.push_str("<tbody>\n");
    html.push_str(&render_table_rows(&context.rows[..shown]));
    html.push_str("</tbody>\n</table>\n</div>\n</section>\n");

    html.push_str(&render_downloads(context));

    html.push_str("<footer class=\"footer\">\n");
    html.push_str("<div>Source: Sui collection indexer (GraphQL).</div>\n");
    html.push_str("</footer>\n");
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_table_header(period: Period) -> String {
    let mut header = String::new();
    header.push_str("<thead><tr>");
    header.push_str("<th>Cover</th>");
    for column in table_columns(period) {
        header.push_str(&format!("<th>{}</th>", escape_html(&column.label)));
    }
    header.push_str("</tr></thead>\n");
    header
}

fn render_table_rows(rows: &[FormattedRow]) -> String {
    let mut body = String::new();
    for row in rows {
        body.push_str("<tr>");
        if row.cover_url.is_empty() {
            body.push_str("<td class=\"cover\"><span class=\"cover-missing\"></span></td>");
        } else {
            body.push_str(&format!(
                "<td class=\"cover\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\"></td>",
                escape_html(&row.cover_url),
                escape_html(&row.title)
            ));
        }
        body.push_str(&format!("<td class=\"num\">{}</td>", row.position));
        let badge = if row.verified {
            " <span class=\"badge\" title=\"Verified\">✓</span>"
        } else {
            ""
        };
        body.push_str(&format!(
            "<td class=\"name\">{}{badge}</td>",
            escape_html(&row.title)
        ));
        body.push_str(&format!(
            "<td class=\"num\">{}</td>",
            cell_or_dash(&row.trades)
        ));
        body.push_str(&render_change_cell(row.trades_change.as_ref()));
        body.push_str(&format!(
            "<td class=\"num\">{}</td>",
            cell_or_dash(&row.usd_volume)
        ));
        body.push_str(&render_change_cell(row.usd_volume_change.as_ref()));
        body.push_str(&format!(
            "<td class=\"num\">{}</td>",
            cell_or_dash(&row.volume)
        ));
        body.push_str(&render_change_cell(row.volume_change.as_ref()));
        body.push_str(&format!(
            "<td class=\"num\">{}</td>",
            cell_or_dash(&row.floor)
        ));
        body.push_str("</tr>\n");
    }
    body
}

fn render_change_cell(indicator: Option<&ChangeIndicator>) -> String {
    indicator.map_or_else(
        || "<td><span class=\"trend neutral\">-</span></td>".to_string(),
        |change| {
            let class = match change.direction {
                ChangeDirection::Increase => "up",
                ChangeDirection::Decrease => "down",
            };
            format!(
                "<td><span class=\"trend {class}\">{}</span></td>",
                escape_html(&change.signed_text())
            )
        },
    )
}

fn cell_or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        escape_html(value)
    }
}

fn render_downloads(context: &HtmlReportContext<'_>) -> String {
    let mut section = String::new();
    section.push_str("<section class=\"downloads\">\n");
    section.push_str("<h3>Downloads</h3>\n");
    let Some(path) = context.paths.csv else {
        section
            .push_str("<p class=\"muted\">No CSV file was saved. Use --save-csv.</p>\n</section>\n");
        return section;
    };

    let full_display = path.to_string_lossy();
    let display_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(full_display.as_ref());
    section.push_str("<div class=\"download-list\">\n<div class=\"download-item\">\n");
    section.push_str("<div class=\"download-label\">Trending CSV</div>\n");
    if let Some(rel) = relative_link(context.output_path, path) {
        section.push_str(&format!(
            "<a class=\"download-link\" href=\"{}\" title=\"{}\">{}</a>\n",
            escape_html(&rel),
            escape_html(full_display.as_ref()),
            escape_html(display_name)
        ));
    } else {
        section.push_str(&format!(
            "<span class=\"download-path\" title=\"{}\">{}</span>\n",
            escape_html(full_display.as_ref()),
            escape_html(display_name)
        ));
    }
    section.push_str("</div>\n</div>\n</section>\n");
    section
}

fn relative_link(html_path: &Path, target: &Path) -> Option<String> {
    let html_dir = html_path.parent()?;
    let target_dir = target.parent()?;
    if html_dir == target_dir {
        target
            .file_name()
            .and_then(|name| name.to_str())
            .map(std::string::ToString::to_string)
    } else {
        None
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const REPORT_STYLE: &str = r"
:root { --bg: #f7f7fb; --ink: #16181d; --muted: #6b7280; --accent: #4f46e5; --up: #047857; --down: #b91c1c; }
* { box-sizing: border-box; }
body { margin: 0; background: var(--bg); color: var(--ink); font: 15px/1.5 system-ui, sans-serif; }
.page { max-width: 1080px; margin: 0 auto; padding: 32px 20px 48px; }
.hero { margin-bottom: 24px; }
.pill { display: inline-block; padding: 2px 10px; border-radius: 999px; background: var(--accent); color: #fff; font-size: 12px; }
h1 { margin: 12px 0 4px; font-size: 30px; }
.subtitle { margin: 0 0 12px; color: var(--muted); }
.meta { display: flex; gap: 24px; flex-wrap: wrap; }
.meta .label { display: block; font-size: 11px; text-transform: uppercase; color: var(--muted); }
.mono { font-family: ui-monospace, monospace; }
.cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 12px; margin-bottom: 24px; }
.card { background: #fff; border: 1px solid #e5e7eb; border-radius: 10px; padding: 14px 16px; }
.card-label { font-size: 12px; color: var(--muted); }
.card-value { font-size: 24px; font-weight: 600; }
.hint { color: var(--muted); font-size: 13px; margin-bottom: 8px; }
.table-wrap { overflow-x: auto; background: #fff; border: 1px solid #e5e7eb; border-radius: 10px; }
table { border-collapse: collapse; width: 100%; }
th, td { padding: 10px 12px; text-align: left; border-bottom: 1px solid #eef0f3; white-space: nowrap; }
th { font-size: 12px; text-transform: uppercase; color: var(--muted); }
td.num { text-align: right; font-variant-numeric: tabular-nums; }
td.cover img { width: 36px; height: 36px; border-radius: 50%; object-fit: cover; display: block; }
.cover-missing { display: block; width: 36px; height: 36px; border-radius: 50%; background: #e5e7eb; }
.badge { color: var(--accent); font-weight: 600; }
.trend.up { color: var(--up); }
.trend.down { color: var(--down); }
.trend.neutral { color: var(--muted); }
.downloads { margin-top: 24px; }
.download-item { display: flex; gap: 12px; align-items: baseline; }
.download-label { color: var(--muted); font-size: 13px; }
.muted { color: var(--muted); }
.footer { margin-top: 32px; color: var(--muted); font-size: 13px; }
";
