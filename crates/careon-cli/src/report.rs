use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use careon_lib::{
    history::HistorySummary,
    result::{DiagnosticResult, Imaging, ImageRef, SignalHealth},
    trend::chart_points,
    Identity, NoticeLevel, Session,
};
use csv::WriterBuilder;

pub fn print_notice(session: &Session) {
    if let Some(notice) = session.notice() {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Error => eprintln!("{}", notice.message),
        }
    }
}

fn pill(health: SignalHealth) -> &'static str {
    match health {
        SignalHealth::Normal => "good",
        SignalHealth::Adverse => "bad",
    }
}

pub fn print_result(result: &DiagnosticResult) {
    println!("Aggregate Stroke Risk: {}% [{}]", result.probability, result.status.label());
    println!();
    println!("Biomarker Analysis");
    println!("  MRI Volume Change:    {}", result.metrics.mri_change);
    println!("  Z-Score (Structural): {}", result.metrics.z_score);
    println!(
        "  Cardiac Signal:       {} ({})",
        result.metrics.ecg_status,
        pill(result.metrics.ecg_health())
    );
    println!(
        "  Neural Signal:        {} ({})",
        result.metrics.eeg_status,
        pill(result.metrics.eeg_health())
    );

    let points = chart_points(result.trend.as_ref());
    if !points.is_empty() {
        println!();
        println!("3-Year Risk Forecast (unmanaged / intervention)");
        for point in &points {
            println!("  {:<10} {:>6} / {:<6}", point.name, point.unmanaged, point.managed);
        }
    }

    if !result.recommendations.is_empty() {
        println!();
        println!("Recommendations");
        for text in &result.recommendations {
            println!("  - {}", text);
        }
    }

    println!();
    match result.imaging() {
        Imaging::Image(ImageRef::Url(url)) => println!("Structural Visualization: {}", url),
        Imaging::Image(ImageRef::Inline {
            content_type,
            bytes,
        }) => println!(
            "Structural Visualization: inline {} ({} bytes)",
            content_type,
            bytes.len()
        ),
        Imaging::SignalOnly => println!("Cardiac/Neural Signal Analysis Only"),
    }
}

pub fn print_history(identity: &Identity, summaries: &[HistorySummary]) {
    println!(
        "Patient Profile: {} | {}",
        identity.display_name(),
        identity.email
    );
    if summaries.is_empty() {
        println!("No previous diagnostic records found for this account.");
        return;
    }
    for summary in summaries {
        println!(
            "  {}  {:<10} risk {:>6}  (#{})",
            summary.date, summary.status, summary.risk_label, summary.id
        );
    }
}

pub fn write_history_csv(path: &Path, summaries: &[HistorySummary]) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(["id", "date", "diagnostic_status", "risk_score"])?;
    for summary in summaries {
        writer.write_record(&[
            summary.id.to_string(),
            summary.date.clone(),
            summary.status.clone(),
            summary.risk_score.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use careon_lib::history::{summarize, HistoryRecord, RecordId};
    use tempfile::tempdir;

    #[test]
    fn writes_history_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let summaries = summarize(&[HistoryRecord {
            id: RecordId::Number(4),
            created_at: Some("2024-06-02T12:00:00".into()),
            diagnostic_status: "LOW".into(),
            risk_score: 11.0,
        }]);
        write_history_csv(&path, &summaries).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,date,diagnostic_status,risk_score"));
        assert_eq!(lines.next(), Some("4,2024-06-02,LOW,11"));
    }
}
