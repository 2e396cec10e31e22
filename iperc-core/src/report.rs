//! Text and JSON renderings of records and listings
//!
//! Global invariants enforced:
//! - Rows are printed in record order, numbered from 1
//! - JSON output uses the stored wire field names
//! - Byte-for-byte identical output across runs

use crate::record::{EvaluationRecord, RecordSummary};
use anyhow::{Context, Result};

/// Render one record as a fixed-width text table
pub fn render_text(record: &EvaluationRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", record.id));
    output.push_str(&format!(
        "Razón Social: {} | Área: {} | Proceso: {}\n",
        record.company, record.area, record.process
    ));
    output.push_str(&format!(
        "Creado: {} | Actualizado: {}\n\n",
        record.created_at.to_rfc3339(),
        record.updated_at.to_rfc3339()
    ));

    output.push_str(&format!(
        "{:<4} {:<24} {:<20} {:<20} {:>2} {:>2} {:>4} {:<12} {}\n",
        "N°", "ACTIVIDAD", "PELIGRO", "CONSECUENCIA", "P", "S", "MR", "NIVEL", "RESPONSABLE"
    ));

    for (i, row) in record.rows.iter().enumerate() {
        output.push_str(&format!(
            "{:<4} {:<24} {:<20} {:<20} {:>2} {:>2} {:>4} {:<12} {}\n",
            i + 1,
            truncate_or_pad(row.activity(), 24),
            truncate_or_pad(row.hazard(), 20),
            truncate_or_pad(row.consequence(), 20),
            row.probability(),
            row.severity(),
            row.magnitude(),
            row.risk_level().as_str(),
            row.responsible().unwrap_or("-"),
        ));
    }

    output
}

/// Render one record as pretty JSON
pub fn render_json(record: &EvaluationRecord) -> Result<String> {
    serde_json::to_string_pretty(record)
        .with_context(|| format!("failed to serialize {}", record.id))
}

/// Render a listing as a fixed-width text table
pub fn render_summaries_text(summaries: &[RecordSummary]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<18} {:<24} {:<16} {:<16} {}\n",
        "ID", "RAZÓN SOCIAL", "ÁREA", "PROCESO", "ACTUALIZADO"
    ));

    for summary in summaries {
        output.push_str(&format!(
            "{:<18} {:<24} {:<16} {:<16} {}\n",
            summary.id,
            truncate_or_pad(&summary.company, 24),
            truncate_or_pad(&summary.area, 16),
            truncate_or_pad(&summary.process, 16),
            summary.updated_at.format("%Y-%m-%d %H:%M"),
        ));
    }

    output
}

/// Render a listing as a JSON array
pub fn render_summaries_json(summaries: &[RecordSummary]) -> Result<String> {
    serde_json::to_string_pretty(summaries).context("failed to serialize summaries")
}

/// Truncate or pad string to a fixed number of characters
fn truncate_or_pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordDraft, RowInput};
    use chrono::{TimeZone, Utc};

    fn record() -> EvaluationRecord {
        let draft = RecordDraft {
            company: "Textil Lima".to_string(),
            area: "Tejeduría".to_string(),
            process: "Hilado".to_string(),
            rows: vec![
                RowInput::new("Operación de telar", "Partes móviles", "Atrapamiento", 1, 1),
                RowInput::new("Limpieza", "Polvo", "Neumoconiosis", 4, 10)
                    .with_responsible("Supervisor"),
            ],
        };
        EvaluationRecord::create(&draft, Utc.with_ymd_and_hms(2026, 7, 20, 12, 0, 0).unwrap())
            .unwrap()
    }

    #[test]
    fn test_truncate_or_pad_counts_chars() {
        assert_eq!(truncate_or_pad("Área", 6), "Área  ");
        assert_eq!(truncate_or_pad("Señalización vial", 8), "Señal...");
    }

    #[test]
    fn test_render_text_rows_in_order() {
        let text = render_text(&record());
        let first = text.find("Operación de telar").unwrap();
        let second = text.find("Limpieza").unwrap();
        assert!(first < second);
        assert!(text.contains("BAJO"));
        assert!(text.contains("ALTO"));
        assert!(text.contains("Supervisor"));
    }

    #[test]
    fn test_render_json_uses_wire_names() {
        let json = render_json(&record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["ipercId"].as_str().unwrap().starts_with("IPERC-2026-"));
        assert_eq!(value["rows"][1]["mr"], 40);
        assert_eq!(value["rows"][1]["riskLevel"], "ALTO");
        assert_eq!(value["rows"][1]["riskColor"], "#ffa500");
    }

    #[test]
    fn test_summaries_render() {
        let summary = record().summary();
        let text = render_summaries_text(&[summary.clone()]);
        assert!(text.lines().nth(1).unwrap().starts_with(&summary.id));

        let json = render_summaries_json(&[summary]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["company"], "Textil Lima");
        assert!(value[0]["updatedAt"].is_string());
    }
}
