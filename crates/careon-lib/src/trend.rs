use serde::{Deserialize, Serialize};

/// Paired risk projections returned by the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub unmanaged: Vec<f64>,
    #[serde(default)]
    pub managed: Vec<f64>,
}

impl TrendSeries {
    /// Number of complete (label, unmanaged, managed) rows.
    pub fn len(&self) -> usize {
        self.labels
            .len()
            .min(self.unmanaged.len())
            .min(self.managed.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub name: String,
    pub unmanaged: f64,
    pub managed: f64,
}

/// Index-aligned zip; stops at the shortest of the three sequences.
pub fn trend_points(trend: &TrendSeries) -> Vec<TrendPoint> {
    trend
        .labels
        .iter()
        .zip(trend.unmanaged.iter())
        .zip(trend.managed.iter())
        .map(|((name, &unmanaged), &managed)| TrendPoint {
            name: name.clone(),
            unmanaged,
            managed,
        })
        .collect()
}

/// An absent trend renders nothing.
pub fn chart_points(trend: Option<&TrendSeries>) -> Vec<TrendPoint> {
    trend.map(trend_points).unwrap_or_default()
}
