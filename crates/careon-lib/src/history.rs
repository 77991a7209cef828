use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(id) => write!(f, "{}", id),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

pub const INVALID_DATE: &str = "Invalid Date";

/// One past analysis as stored by the service, in service order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: RecordId,
    #[serde(default)]
    pub created_at: Option<String>,
    pub diagnostic_status: String,
    pub risk_score: f64,
}

impl HistoryRecord {
    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub id: RecordId,
    pub date: String,
    pub status: String,
    pub status_class: String,
    pub risk_score: f64,
    pub risk_label: String,
}

/// Accepts RFC 3339 as well as the offset-less ISO timestamps Python backends emit.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn summarize_record(record: &HistoryRecord) -> HistorySummary {
    let date = record
        .created_date()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .or_else(|| record.created_at.clone().filter(|raw| !raw.trim().is_empty()))
        .unwrap_or_else(|| INVALID_DATE.to_string());
    HistorySummary {
        id: record.id.clone(),
        date,
        status: record.diagnostic_status.clone(),
        status_class: record.diagnostic_status.to_lowercase(),
        risk_score: record.risk_score,
        risk_label: format!("{}%", record.risk_score),
    }
}

pub fn summarize(records: &[HistoryRecord]) -> Vec<HistorySummary> {
    records.iter().map(summarize_record).collect()
}
