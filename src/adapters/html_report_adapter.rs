//! HTML report adapter implementing ReportPort.
//!
//! Single self-contained page: headline metrics, equity chart with trade
//! markers, monthly returns and the trade log.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::Datelike;

use crate::adapters::chart_svg::generate_equity_svg;
use crate::domain::backtest::{BacktestResult, EquityPoint};
use crate::domain::error::QuantError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::{ReportContext, ReportPort};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

struct MonthlyReturnRow {
    year: i32,
    months: Vec<Option<f64>>,
}

fn compute_monthly_returns(equity_curve: &[EquityPoint]) -> Vec<MonthlyReturnRow> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }

    let mut monthly: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for window in equity_curve.windows(2) {
        let (prev, curr) = (&window[0], &window[1]);
        let growth = if prev.equity > 0.0 {
            curr.equity / prev.equity
        } else {
            1.0
        };
        *monthly
            .entry((curr.date.year(), curr.date.month()))
            .or_insert(1.0) *= growth;
    }

    let (Some(&(min_year, _)), Some(&(max_year, _))) =
        (monthly.keys().next(), monthly.keys().next_back())
    else {
        return Vec::new();
    };

    (min_year..=max_year)
        .map(|year| MonthlyReturnRow {
            year,
            months: (1..=12u32)
                .map(|month| monthly.get(&(year, month)).map(|g| (g - 1.0) * 100.0))
                .collect(),
        })
        .collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn signed_money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", value.abs())
    } else {
        format!("${:.2}", value)
    }
}

fn tile(label: &str, value: &str) -> String {
    format!(
        r#"<div class="tile"><div class="label">{}</div><div class="value">{}</div></div>"#,
        label, value
    )
}

fn render(result: &BacktestResult, metrics: &Metrics, ctx: &ReportContext<'_>) -> String {
    let mut html = String::new();
    let title = format!("{} / {}", escape(ctx.symbol), escape(ctx.strategy_name));

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Backtest Report: {title}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; color: #111827; }}
.tiles {{ display: flex; gap: 1rem; flex-wrap: wrap; }}
.tile {{ border: 1px solid #e5e7eb; border-radius: 6px; padding: 0.75rem 1rem; }}
.label {{ font-size: 0.8rem; color: #6b7280; }}
.value {{ font-size: 1.3rem; }}
table {{ border-collapse: collapse; margin-top: 0.5rem; }}
th, td {{ border: 1px solid #e5e7eb; padding: 0.25rem 0.6rem; text-align: right; }}
</style>
</head>
<body>
<h1>Backtest Report</h1>
<p>{title}: {start} to {end}, starting capital ${capital:.2}</p>
<p>Indicators: {indicators}</p>
"#,
        title = title,
        indicators = escape(ctx.indicators),
        start = ctx.start_date,
        end = ctx.end_date,
        capital = result.initial_capital,
    );

    html.push_str(r#"<div class="tiles">"#);
    html.push_str(&tile("Net Profit", &signed_money(metrics.net_profit)));
    html.push_str(&tile(
        "Annualized Return",
        &format!("{:.2}%", metrics.annualized_return * 100.0),
    ));
    html.push_str(&tile(
        "Total Return",
        &format!("{:.2}%", metrics.total_return * 100.0),
    ));
    html.push_str(&tile(
        "Max Drawdown",
        &format!("-{:.2}%", metrics.max_drawdown * 100.0),
    ));
    html.push_str(&tile("Round Trips", &metrics.total_trades.to_string()));
    html.push_str(&tile(
        "Win Rate",
        &format!("{:.1}%", metrics.win_rate * 100.0),
    ));
    html.push_str("</div>\n");

    html.push_str("<h2>Equity Chart</h2>\n");
    html.push_str(&generate_equity_svg(&result.equity_curve, &result.trades));
    html.push('\n');

    let monthly = compute_monthly_returns(&result.equity_curve);
    if !monthly.is_empty() {
        html.push_str("<h2>Monthly Returns</h2>\n<table>\n<tr><th>Year</th>");
        for month in MONTHS {
            let _ = write!(html, "<th>{}</th>", month);
        }
        html.push_str("</tr>\n");
        for row in &monthly {
            let _ = write!(html, "<tr><td>{}</td>", row.year);
            for value in &row.months {
                match value {
                    Some(pct) => {
                        let _ = write!(html, "<td>{:.2}%</td>", pct);
                    }
                    None => html.push_str("<td></td>"),
                }
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>\n");
    }

    html.push_str("<h2>Trade Log</h2>\n");
    if result.trades.is_empty() {
        html.push_str("<p>No trades.</p>\n");
    } else {
        html.push_str(
            "<table>\n<tr><th>Date</th><th>Action</th><th>Price</th><th>Quantity</th><th>Cash</th></tr>\n",
        );
        for trade in &result.trades {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td><td>{:.2}</td></tr>",
                trade.date, trade.action, trade.price, trade.quantity, trade.cash_after
            );
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        context: &ReportContext<'_>,
        output_path: &str,
    ) -> Result<(), QuantError> {
        let html = render(result, metrics, context);

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html)?;

        Ok(())
    }
}
