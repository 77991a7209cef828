use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize, Serializer};

use crate::trend::TrendSeries;

/// Analysis payload exactly as the remote service sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAnalysis {
    pub probability: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub metrics: RawMetrics,
    #[serde(default)]
    pub trend: Option<TrendSeries>,
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetrics {
    #[serde(default)]
    pub mri_change: MetricValue,
    #[serde(default)]
    pub z_score: MetricValue,
    #[serde(default)]
    pub ecg_status: String,
    #[serde(default)]
    pub eeg_status: String,
}

/// Scalar metric that may arrive as a number, a text marker ("N/A") or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(value) => write!(f, "{}", value),
            MetricValue::Text(text) => f.write_str(text),
            MetricValue::Missing => f.write_str("--"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskStatus {
    Low,
    Moderate,
    High,
    Other(String),
}

impl RiskStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "LOW" => RiskStatus::Low,
            "MODERATE" => RiskStatus::Moderate,
            "HIGH" => RiskStatus::High,
            _ => RiskStatus::Other(label.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RiskStatus::Low => "LOW",
            RiskStatus::Moderate => "MODERATE",
            RiskStatus::High => "HIGH",
            RiskStatus::Other(label) => label,
        }
    }
}

impl Serialize for RiskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SignalKind {
    Ecg,
    Eeg,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SignalHealth {
    Normal,
    Adverse,
}

pub struct SignalMarker {
    pub kind: SignalKind,
    pub marker: &'static str,
    pub on_match: SignalHealth,
    pub otherwise: SignalHealth,
}

/// Status markers agreed with the analysis service.
///
/// | signal | marker     | contains ⇒ | otherwise ⇒ |
/// |--------|------------|------------|-------------|
/// | ECG    | `ABNORMAL` | Adverse    | Normal      |
/// | EEG    | `STABLE`   | Normal     | Adverse     |
///
/// Matching is a case-sensitive substring test, so an EEG status of
/// `"UNSTABLE"` classifies as Normal.
// TODO: confirm with the analysis service owners whether "UNSTABLE" should be adverse.
pub const SIGNAL_MARKERS: [SignalMarker; 2] = [
    SignalMarker {
        kind: SignalKind::Ecg,
        marker: "ABNORMAL",
        on_match: SignalHealth::Adverse,
        otherwise: SignalHealth::Normal,
    },
    SignalMarker {
        kind: SignalKind::Eeg,
        marker: "STABLE",
        on_match: SignalHealth::Normal,
        otherwise: SignalHealth::Adverse,
    },
];

pub fn classify_signal(kind: SignalKind, status: &str) -> SignalHealth {
    SIGNAL_MARKERS
        .iter()
        .find(|entry| entry.kind == kind)
        .map(|entry| {
            if status.contains(entry.marker) {
                entry.on_match
            } else {
                entry.otherwise
            }
        })
        .unwrap_or(SignalHealth::Normal)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub mri_change: MetricValue,
    pub z_score: MetricValue,
    pub ecg_status: String,
    pub eeg_status: String,
}

impl Metrics {
    pub fn ecg_health(&self) -> SignalHealth {
        classify_signal(SignalKind::Ecg, &self.ecg_status)
    }

    pub fn eeg_health(&self) -> SignalHealth {
        classify_signal(SignalKind::Eeg, &self.eeg_status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Url(String),
    Inline { content_type: String, bytes: Vec<u8> },
}

impl ImageRef {
    /// `data:<type>;base64,<payload>` decodes to inline bytes; anything else is kept as a URL.
    pub fn parse(src: &str) -> Self {
        if let Some((content_type, payload)) = src
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
        {
            if let Ok(bytes) = general_purpose::STANDARD.decode(payload.trim()) {
                return ImageRef::Inline {
                    content_type: content_type.to_string(),
                    bytes,
                };
            }
        }
        ImageRef::Url(src.to_string())
    }

    pub fn to_src(&self) -> String {
        match self {
            ImageRef::Url(url) => url.clone(),
            ImageRef::Inline {
                content_type,
                bytes,
            } => format!(
                "data:{};base64,{}",
                content_type,
                general_purpose::STANDARD.encode(bytes)
            ),
        }
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_src())
    }
}

/// What the structural visualization panel should show.
#[derive(Debug, PartialEq, Eq)]
pub enum Imaging<'a> {
    Image(&'a ImageRef),
    SignalOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticResult {
    pub probability: f64,
    pub status: RiskStatus,
    pub metrics: Metrics,
    pub trend: Option<TrendSeries>,
    pub recommendations: Vec<String>,
    pub image: Option<ImageRef>,
}

impl DiagnosticResult {
    pub fn imaging(&self) -> Imaging<'_> {
        match &self.image {
            Some(image) => Imaging::Image(image),
            None => Imaging::SignalOnly,
        }
    }
}

pub fn normalize(raw: RawAnalysis) -> DiagnosticResult {
    let probability = if raw.probability.is_finite() {
        raw.probability.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let image = raw
        .image
        .filter(|src| !src.trim().is_empty())
        .map(|src| ImageRef::parse(&src));
    DiagnosticResult {
        probability,
        status: RiskStatus::from_label(&raw.status),
        metrics: Metrics {
            mri_change: raw.metrics.mri_change,
            z_score: raw.metrics.z_score,
            ecg_status: raw.metrics.ecg_status,
            eeg_status: raw.metrics.eeg_status,
        },
        trend: raw.trend,
        recommendations: raw.recommendations.unwrap_or_default(),
        image,
    }
}
