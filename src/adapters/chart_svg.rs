//! Inline SVG equity chart with trade markers.

use crate::domain::backtest::EquityPoint;
use crate::domain::position::{TradeAction, TradeEvent};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 300.0;
const PADDING: f64 = 40.0;

struct Scale {
    min_equity: f64,
    scale_x: f64,
    scale_y: f64,
}

impl Scale {
    fn new(equity_curve: &[EquityPoint]) -> Self {
        let min_equity = equity_curve
            .iter()
            .map(|p| p.equity)
            .fold(f64::INFINITY, f64::min);
        let max_equity = equity_curve
            .iter()
            .map(|p| p.equity)
            .fold(f64::NEG_INFINITY, f64::max);

        let plot_width = WIDTH - 2.0 * PADDING;
        let plot_height = HEIGHT - 2.0 * PADDING;
        let range = max_equity - min_equity;

        Scale {
            min_equity,
            scale_x: if equity_curve.len() > 1 {
                plot_width / (equity_curve.len() - 1) as f64
            } else {
                0.0
            },
            scale_y: if range > 0.0 { plot_height / range } else { 0.0 },
        }
    }

    fn x(&self, index: usize) -> f64 {
        PADDING + index as f64 * self.scale_x
    }

    fn y(&self, equity: f64) -> f64 {
        if self.scale_y == 0.0 {
            HEIGHT / 2.0
        } else {
            HEIGHT - PADDING - (equity - self.min_equity) * self.scale_y
        }
    }
}

fn marker(scale: &Scale, index: usize, point: &EquityPoint, trade: &TradeEvent) -> String {
    let x = scale.x(index);
    let y = scale.y(point.equity);
    let title = format!(
        "{} {} x {} @ {:.2}",
        trade.date, trade.action, trade.quantity, trade.price
    );
    match trade.action {
        TradeAction::Buy => format!(
            r##"<path class="marker buy" d="M{:.1},{:.1} l-6,10 h12 z" fill="#16a34a"><title>{}</title></path>"##,
            x,
            y + 4.0,
            title
        ),
        TradeAction::Sell | TradeAction::SellEnd => format!(
            r##"<path class="marker sell" d="M{:.1},{:.1} l-6,-10 h12 z" fill="#dc2626"><title>{}</title></path>"##,
            x,
            y - 4.0,
            title
        ),
    }
}

pub fn generate_equity_svg(equity_curve: &[EquityPoint], trades: &[TradeEvent]) -> String {
    if equity_curve.is_empty() {
        return "<p>No equity data available.</p>".to_string();
    }

    let scale = Scale::new(equity_curve);
    let points: Vec<String> = equity_curve
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:.1},{:.1}", scale.x(i), scale.y(p.equity)))
        .collect();

    let markers: Vec<String> = trades
        .iter()
        .filter_map(|trade| {
            let index = equity_curve
                .binary_search_by_key(&trade.date, |p| p.date)
                .ok()?;
            Some(marker(&scale, index, &equity_curve[index], trade))
        })
        .collect();

    let first = &equity_curve[0];
    let last = &equity_curve[equity_curve.len() - 1];

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<line x1="{p}" y1="{p}" x2="{p}" y2="{base}" stroke="#9ca3af"/>
<line x1="{p}" y1="{base}" x2="{right}" y2="{base}" stroke="#9ca3af"/>
<polyline fill="none" stroke="#2563eb" stroke-width="1.5" points="{points}"/>
{markers}
<text x="{p}" y="{label_y}" font-size="11">{start}</text>
<text x="{right}" y="{label_y}" font-size="11" text-anchor="end">{end}</text>
</svg>"##,
        w = WIDTH,
        h = HEIGHT,
        p = PADDING,
        base = HEIGHT - PADDING,
        right = WIDTH - PADDING,
        label_y = HEIGHT - PADDING / 3.0,
        points = points.join(" "),
        markers = markers.join("\n"),
        start = first.date,
        end = last.date,
    )
}
