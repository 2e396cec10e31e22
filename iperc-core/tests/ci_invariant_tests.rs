//! CI Invariant Tests
//!
//! These tests explicitly validate critical invariants that must always hold.
//! Run in CI to prevent regressions.

use chrono::{TimeZone, Utc};
use iperc_core::layout::{self, ColumnKind, LayoutOptions, TextRole};
use iperc_core::record::{EvaluationRecord, HazardRow, RecordDraft, RowInput};
use iperc_core::risk::{self, RiskLevel, RISK_BANDS};
use iperc_core::RecordError;

#[test]
fn test_band_boundaries_belong_to_lower_band() {
    let expected = [
        (0..=3, RiskLevel::Low),
        (4..=10, RiskLevel::Medium),
        (11..=50, RiskLevel::High),
        (51..=250, RiskLevel::Critical),
        (251..=400, RiskLevel::Undefined),
    ];
    for (range, level) in expected {
        for magnitude in range {
            assert_eq!(risk::classify(magnitude).level, level, "magnitude {}", magnitude);
        }
    }
    assert_eq!(risk::classify(u32::MAX).level, RiskLevel::Undefined);
}

#[test]
fn test_band_table_is_ascending_with_catch_all_last() {
    let bounds: Vec<u32> = RISK_BANDS.iter().filter_map(|b| b.upper_bound).collect();
    assert_eq!(bounds, vec![3, 10, 50, 250]);
    assert!(bounds.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(RISK_BANDS.last().unwrap().upper_bound, None);
}

#[test]
fn test_classification_is_idempotent() {
    for magnitude in 0..=300 {
        assert_eq!(risk::classify(magnitude), risk::classify(magnitude));
    }
}

#[test]
fn test_every_valid_row_scores_as_product() {
    for p in 1..=5i64 {
        for s in 1..=50i64 {
            let row = HazardRow::try_from(RowInput::new("a", "b", "c", p, s)).unwrap();
            let magnitude = (p * s) as u32;
            assert_eq!(row.magnitude(), magnitude);
            let c = risk::classify(magnitude);
            assert_eq!(row.risk_level(), c.level);
            assert_eq!(row.risk_color(), c.color);
            // a valid row never lands in the catch-all band
            assert_ne!(row.risk_level(), RiskLevel::Undefined);
        }
    }
}

#[test]
fn test_reference_scenarios() {
    let cases = [
        (3, 10, 30, "#ffa500", "ALTO", "naranja"),
        (5, 50, 250, "#ff6b6b", "CRÍTICO", "rojo"),
        (1, 1, 1, "#4cd137", "BAJO", "verde"),
        (2, 5, 10, "#ffd700", "MEDIO", "amarillo"),
    ];
    for (p, s, mr, color, level, class) in cases {
        let (magnitude, c) = risk::score(p, s);
        assert_eq!(magnitude, mr);
        assert_eq!(c.color, color);
        assert_eq!(c.level.as_str(), level);
        assert_eq!(c.class, class);
    }
}

#[test]
fn test_zero_rows_rejected_before_layout() {
    let draft = RecordDraft {
        company: "Empresa".to_string(),
        area: "Área".to_string(),
        process: "Proceso".to_string(),
        rows: vec![RowInput::default(), RowInput::default()],
    };
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(
        EvaluationRecord::create(&draft, now).unwrap_err(),
        RecordError::NoRows
    );

    // a record emptied after the fact is still refused by the layout engine
    let one_row = RecordDraft {
        rows: vec![RowInput::new("a", "b", "c", 1, 1)],
        ..draft
    };
    let mut record = EvaluationRecord::create(&one_row, now).unwrap();
    record.rows.clear();
    assert_eq!(
        layout::layout(&record, &LayoutOptions::default()).unwrap_err(),
        RecordError::NoRows
    );
}

#[test]
fn test_drawn_magnitude_matches_stored_fields() {
    let rows = (1..=5)
        .flat_map(|p| [1, 7, 13, 50].map(|s| RowInput::new("Tarea", "Peligro", "Daño", p, s)))
        .collect();
    let draft = RecordDraft {
        company: "Empresa".to_string(),
        area: "Área".to_string(),
        process: "Proceso".to_string(),
        rows,
    };
    let record =
        EvaluationRecord::create(&draft, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
            .unwrap();
    let report = layout::layout(&record, &LayoutOptions::default()).unwrap();

    for page in &report.pages {
        for text in page.texts() {
            if let TextRole::Cell {
                row,
                column: ColumnKind::Magnitude,
            } = text.role
            {
                let stored = &record.rows[row - 1];
                let product = stored.probability() as u32 * stored.severity() as u32;
                assert_eq!(text.text, product.to_string());
            }
        }
    }
}
