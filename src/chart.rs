// src/chart.rs
use crate::pages::escape;
use std::fmt::Write;

pub const UPTREND_COLOR: &str = "rgb(0, 200, 5)";
pub const DOWNTREND_COLOR: &str = "rgb(255, 80, 0)";

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceChart {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub color: &'static str,
}

impl PriceChart {
    /// Returns `None` for an empty series.
    pub fn new(title: impl Into<String>, values: Vec<f64>) -> Option<Self> {
        let color = trend_color(&values)?;
        Some(Self {
            title: title.into(),
            labels: hour_labels(values.len()),
            values,
            color,
        })
    }

    pub fn to_svg(&self) -> String {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let (lo, hi) = bounds(&self.values);
        let span = if hi > lo { hi - lo } else { 1.0 };
        let step = if self.values.len() > 1 {
            plot_w / (self.values.len() - 1) as f64
        } else {
            0.0
        };
        let point = |i: usize, v: f64| {
            let x = MARGIN_LEFT + step * i as f64;
            let y = MARGIN_TOP + plot_h - (v - lo) / span * plot_h;
            (x, y)
        };

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img">"#,
            w = WIDTH,
            h = HEIGHT
        );
        let _ = write!(
            svg,
            r#"<text x="{}" y="32" font-size="18" text-anchor="middle">{}</text>"#,
            WIDTH / 2.0,
            escape(&self.title)
        );
        let _ = write!(
            svg,
            r##"<g stroke="#ccc"><line x1="{l}" y1="{b}" x2="{r}" y2="{b}"/><line x1="{l}" y1="{t}" x2="{l}" y2="{b}"/></g>"##,
            l = MARGIN_LEFT,
            r = WIDTH - MARGIN_RIGHT,
            t = MARGIN_TOP,
            b = MARGIN_TOP + plot_h
        );

        let points: Vec<String> = self
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let (x, y) = point(i, *v);
                format!("{:.1},{:.1}", x, y)
            })
            .collect();
        let _ = write!(
            svg,
            r#"<polyline fill="none" stroke="{}" stroke-width="2" points="{}"/>"#,
            self.color,
            points.join(" ")
        );
        for (i, (label, v)) in self.labels.iter().zip(&self.values).enumerate() {
            let (x, y) = point(i, *v);
            let _ = write!(
                svg,
                r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{}"><title>{}: ${:.2}</title></circle>"#,
                x, y, self.color, label, v
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="middle">{}</text>"#,
                x,
                MARGIN_TOP + plot_h + 18.0,
                label
            );
        }
        for (value, y) in [(hi, MARGIN_TOP), (lo, MARGIN_TOP + plot_h)] {
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{:.2}</text>"#,
                MARGIN_LEFT - 8.0,
                y + 4.0,
                value
            );
        }
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="14" text-anchor="middle">Hour</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            HEIGHT - 20.0
        );
        let _ = write!(
            svg,
            r#"<text x="20" y="{:.1}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {:.1})">Price ($)</text>"#,
            MARGIN_TOP + plot_h / 2.0,
            MARGIN_TOP + plot_h / 2.0
        );
        svg.push_str("</svg>");
        svg
    }
}

/// `1:00`, `2:00`, ... one label per point.
pub fn hour_labels(count: usize) -> Vec<String> {
    (1..=count).map(|hour| format!("{}:00", hour)).collect()
}

/// Green when the series closes above where it opened, orange otherwise.
pub fn trend_color(values: &[f64]) -> Option<&'static str> {
    let first = values.first()?;
    let last = values.last()?;
    Some(if last > first {
        UPTREND_COLOR
    } else {
        DOWNTREND_COLOR
    })
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
}
