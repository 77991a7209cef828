use serde::{Deserialize, Serialize};

use crate::trend::{trend_points, TrendSeries};

const UNMANAGED_COLOR: u32 = 0xFF4D4D;
const MANAGED_COLOR: u32 = 0x4CAF50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
    /// Category labels for integer x positions.
    #[serde(default)]
    pub ticks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis::default(),
            y: Axis::default(),
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// Min/max over every plotted point as `(x_min, x_max, y_min, y_max)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|series| match series {
            Series::Line(line) => line.points.iter(),
        });
        let first = points.next()?;
        let init = (first[0], first[0], first[1], first[1]);
        Some(points.fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
        }))
    }
}

/// Risk forecast chart; `None` when there is nothing to draw.
pub fn trend_figure(trend: Option<&TrendSeries>) -> Option<Figure> {
    let points = trend_points(trend?);
    if points.is_empty() {
        return None;
    }
    let mut fig = Figure::new(Some("3-Year Risk Forecast".to_string()));
    fig.x.ticks = points.iter().map(|p| p.name.clone()).collect();
    fig.y.label = Some("Risk %".into());
    fig.add_series(Series::Line(LineSeries {
        name: "Unmanaged Trend".into(),
        points: points
            .iter()
            .enumerate()
            .map(|(i, p)| [i as f64, p.unmanaged])
            .collect(),
        style: Style {
            width: 3.0,
            dash: Some([5.0, 5.0]),
            color: Color(UNMANAGED_COLOR),
        },
    }));
    fig.add_series(Series::Line(LineSeries {
        name: "Intervention Path".into(),
        points: points
            .iter()
            .enumerate()
            .map(|(i, p)| [i as f64, p.managed])
            .collect(),
        style: Style {
            width: 3.0,
            dash: None,
            color: Color(MANAGED_COLOR),
        },
    }));
    Some(fig)
}
