//! Evaluation records and scored hazard rows
//!
//! Global invariants enforced:
//! - A row's magnitude is always `probability * severity`, recomputed whenever a
//!   row is built (including when it is read back from storage)
//! - Risk color and level are a pure function of the magnitude
//! - Row order is insertion order and drives the N° column
//! - Records are never mutated on edit; a revised record supersedes the old one

use crate::error::RecordError;
use crate::risk::{self, RiskLevel};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Accepted probability values
pub const PROBABILITY_RANGE: RangeInclusive<u8> = 1..=5;

/// Accepted severity values
pub const SEVERITY_RANGE: RangeInclusive<u8> = 1..=50;

/// One hazard row as submitted, before validation and scoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowInput {
    pub activity: String,
    pub hazard: String,
    pub consequence: String,
    pub existing_controls: Option<String>,
    pub probability: i64,
    pub severity: i64,
    pub new_controls: Option<String>,
    pub responsible: Option<String>,
}

impl RowInput {
    pub fn new(
        activity: impl Into<String>,
        hazard: impl Into<String>,
        consequence: impl Into<String>,
        probability: i64,
        severity: i64,
    ) -> Self {
        RowInput {
            activity: activity.into(),
            hazard: hazard.into(),
            consequence: consequence.into(),
            probability,
            severity,
            ..RowInput::default()
        }
    }

    pub fn with_existing_controls(mut self, controls: impl Into<String>) -> Self {
        self.existing_controls = Some(controls.into());
        self
    }

    pub fn with_new_controls(mut self, controls: impl Into<String>) -> Self {
        self.new_controls = Some(controls.into());
        self
    }

    pub fn with_responsible(mut self, responsible: impl Into<String>) -> Self {
        self.responsible = Some(responsible.into());
        self
    }

    /// A row without an activity is an untouched form row
    pub fn is_blank(&self) -> bool {
        self.activity.trim().is_empty()
    }
}

/// A validated, scored hazard row
///
/// Fields are private so the derived values cannot drift from their inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RowInput")]
pub struct HazardRow {
    activity: String,
    hazard: String,
    consequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    existing_controls: Option<String>,
    probability: u8,
    severity: u8,
    #[serde(rename = "mr")]
    magnitude: u32,
    risk_color: String,
    risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_controls: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    responsible: Option<String>,
}

impl HazardRow {
    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn hazard(&self) -> &str {
        &self.hazard
    }

    pub fn consequence(&self) -> &str {
        &self.consequence
    }

    pub fn existing_controls(&self) -> Option<&str> {
        self.existing_controls.as_deref()
    }

    pub fn probability(&self) -> u8 {
        self.probability
    }

    pub fn severity(&self) -> u8 {
        self.severity
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    pub fn risk_color(&self) -> &str {
        &self.risk_color
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn new_controls(&self) -> Option<&str> {
        self.new_controls.as_deref()
    }

    pub fn responsible(&self) -> Option<&str> {
        self.responsible.as_deref()
    }

    /// Convert back into an editable input (edit round trip)
    pub fn to_input(&self) -> RowInput {
        RowInput {
            activity: self.activity.clone(),
            hazard: self.hazard.clone(),
            consequence: self.consequence.clone(),
            existing_controls: self.existing_controls.clone(),
            probability: i64::from(self.probability),
            severity: i64::from(self.severity),
            new_controls: self.new_controls.clone(),
            responsible: self.responsible.clone(),
        }
    }

    fn from_input(input: &RowInput) -> Result<Self, String> {
        let activity = required_text(&input.activity, "activity")?;
        let hazard = required_text(&input.hazard, "hazard")?;
        let consequence = required_text(&input.consequence, "consequence")?;
        let probability = in_range(input.probability, &PROBABILITY_RANGE, "probability")?;
        let severity = in_range(input.severity, &SEVERITY_RANGE, "severity")?;

        let (magnitude, classification) = risk::score(probability, severity);

        Ok(HazardRow {
            activity,
            hazard,
            consequence,
            existing_controls: optional_text(input.existing_controls.as_deref()),
            probability,
            severity,
            magnitude,
            risk_color: classification.color.to_string(),
            risk_level: classification.level,
            new_controls: optional_text(input.new_controls.as_deref()),
            responsible: optional_text(input.responsible.as_deref()),
        })
    }
}

impl TryFrom<RowInput> for HazardRow {
    type Error = RecordError;

    fn try_from(input: RowInput) -> Result<Self, Self::Error> {
        HazardRow::from_input(&input).map_err(RecordError::InvalidRow)
    }
}

fn required_text(value: &str, field: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn in_range(value: i64, range: &RangeInclusive<u8>, field: &str) -> Result<u8, String> {
    u8::try_from(value)
        .ok()
        .filter(|v| range.contains(v))
        .ok_or_else(|| {
            format!(
                "{} must be between {} and {} (got {})",
                field,
                range.start(),
                range.end(),
                value
            )
        })
}

/// Submitted header plus row list, the single structured input for create/edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordDraft {
    pub company: String,
    pub area: String,
    pub process: String,
    pub rows: Vec<RowInput>,
}

impl RecordDraft {
    /// Validate the header and score every non-blank row
    ///
    /// Rows with a blank activity are skipped. Row numbers in error messages
    /// refer to the submitted position (1-based).
    pub fn validate(&self) -> Result<Vec<HazardRow>, RecordError> {
        require_header(&self.company, "company")?;
        require_header(&self.area, "area")?;
        require_header(&self.process, "process")?;

        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, input)| !input.is_blank())
            .map(|(idx, input)| {
                HazardRow::from_input(input).map_err(|reason| {
                    RecordError::InvalidRow(format!("row {}: {}", idx + 1, reason))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Err(RecordError::NoRows);
        }
        Ok(rows)
    }

    /// Editable draft prefilled from a stored record
    pub fn from_record(record: &EvaluationRecord) -> Self {
        RecordDraft {
            company: record.company.clone(),
            area: record.area.clone(),
            process: record.process.clone(),
            rows: record.rows.iter().map(HazardRow::to_input).collect(),
        }
    }
}

fn require_header(value: &str, field: &'static str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::MissingField(field));
    }
    Ok(())
}

/// One IPERC assessment: header plus ordered hazard rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    #[serde(rename = "ipercId")]
    pub id: String,
    pub company: String,
    pub area: String,
    pub process: String,
    pub rows: Vec<HazardRow>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EvaluationRecord {
    /// Build a new record from a draft, generating its id
    pub fn create(draft: &RecordDraft, now: DateTime<Utc>) -> Result<Self, RecordError> {
        let rows = draft.validate()?;
        Ok(EvaluationRecord {
            id: generate_id(now),
            company: draft.company.trim().to_string(),
            area: draft.area.trim().to_string(),
            process: draft.process.trim().to_string(),
            rows,
            created_at: now,
            updated_at: now,
        })
    }

    /// Build the record that supersedes this one after an edit
    ///
    /// Keeps `id` and `created_at`; everything else comes from the draft.
    pub fn revise(&self, draft: &RecordDraft, now: DateTime<Utc>) -> Result<Self, RecordError> {
        let rows = draft.validate()?;
        Ok(EvaluationRecord {
            id: self.id.clone(),
            company: draft.company.trim().to_string(),
            area: draft.area.trim().to_string(),
            process: draft.process.trim().to_string(),
            rows,
            created_at: self.created_at,
            updated_at: now,
        })
    }

    /// Check the invariants required before storing or rendering
    pub fn validate(&self) -> Result<(), RecordError> {
        require_header(&self.company, "company")?;
        require_header(&self.area, "area")?;
        require_header(&self.process, "process")?;
        if self.rows.is_empty() {
            return Err(RecordError::NoRows);
        }
        Ok(())
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            company: self.company.clone(),
            area: self.area.clone(),
            process: self.process.clone(),
            updated_at: self.updated_at,
        }
    }

    /// True when any row names `name` as responsible (case-insensitive)
    pub fn has_responsible(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return false;
        }
        self.rows
            .iter()
            .filter_map(HazardRow::responsible)
            .any(|r| r.to_lowercase() == wanted)
    }

    /// Highest risk level present in the record
    pub fn worst_level(&self) -> Option<RiskLevel> {
        self.rows
            .iter()
            .max_by_key(|row| row.magnitude())
            .map(HazardRow::risk_level)
    }
}

/// Listing entry for a stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    #[serde(rename = "ipercId")]
    pub id: String,
    pub company: String,
    pub area: String,
    pub process: String,
    pub updated_at: DateTime<Utc>,
}

/// Generate a record id of the form `IPERC-<year>-<6 uppercase hex digits>`
pub fn generate_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("IPERC-{}-{}", now.year(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    fn draft(rows: Vec<RowInput>) -> RecordDraft {
        RecordDraft {
            company: "Constructora Andina SAC".to_string(),
            area: "Obras civiles".to_string(),
            process: "Excavación".to_string(),
            rows,
        }
    }

    #[test]
    fn test_row_scoring_matches_product() {
        let row = HazardRow::try_from(RowInput::new("Excavar", "Derrumbe", "Atrapamiento", 3, 10))
            .unwrap();
        assert_eq!(row.magnitude(), 30);
        assert_eq!(row.risk_level(), RiskLevel::High);
        assert_eq!(row.risk_color(), "#ffa500");
    }

    #[test]
    fn test_row_rejects_out_of_range_probability() {
        let err = HazardRow::try_from(RowInput::new("a", "b", "c", 6, 10)).unwrap_err();
        assert!(err.to_string().contains("probability"));

        let err = HazardRow::try_from(RowInput::new("a", "b", "c", 0, 10)).unwrap_err();
        assert!(err.to_string().contains("probability"));

        let err = HazardRow::try_from(RowInput::new("a", "b", "c", -2, 10)).unwrap_err();
        assert!(err.to_string().contains("probability"));
    }

    #[test]
    fn test_row_rejects_out_of_range_severity() {
        let err = HazardRow::try_from(RowInput::new("a", "b", "c", 2, 51)).unwrap_err();
        assert!(err.to_string().contains("severity"));
    }

    #[test]
    fn test_optional_fields_are_trimmed_to_none() {
        let row = HazardRow::try_from(
            RowInput::new("a", "b", "c", 1, 1)
                .with_existing_controls("   ")
                .with_responsible(" Ana "),
        )
        .unwrap();
        assert_eq!(row.existing_controls(), None);
        assert_eq!(row.responsible(), Some("Ana"));
    }

    #[test]
    fn test_draft_skips_blank_rows() {
        let rows = draft(vec![
            RowInput::new("Soldar", "Humos", "Intoxicación", 2, 5),
            RowInput::default(),
            RowInput::new("Izar", "Caída de carga", "Golpe", 1, 50),
        ])
        .validate()
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].activity(), "Izar");
    }

    #[test]
    fn test_draft_with_no_rows_is_rejected() {
        assert_eq!(draft(vec![]).validate(), Err(RecordError::NoRows));
        assert_eq!(
            draft(vec![RowInput::default()]).validate(),
            Err(RecordError::NoRows)
        );
    }

    #[test]
    fn test_draft_requires_header_fields() {
        let mut d = draft(vec![RowInput::new("a", "b", "c", 1, 1)]);
        d.area = "  ".to_string();
        assert_eq!(d.validate(), Err(RecordError::MissingField("area")));
    }

    #[test]
    fn test_invalid_row_reports_submitted_position() {
        let err = draft(vec![
            RowInput::new("a", "b", "c", 1, 1),
            RowInput::default(),
            RowInput::new("x", "", "z", 1, 1),
        ])
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidRow("row 3: hazard is required".to_string())
        );
    }

    #[test]
    fn test_create_sets_id_and_timestamps() {
        let record =
            EvaluationRecord::create(&draft(vec![RowInput::new("a", "b", "c", 1, 1)]), now())
                .unwrap();
        assert!(record.id.starts_with("IPERC-2026-"));
        assert_eq!(record.id.len(), "IPERC-2026-".len() + 6);
        assert!(record.id["IPERC-2026-".len()..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(record.created_at, now());
        assert_eq!(record.updated_at, now());
    }

    #[test]
    fn test_revise_keeps_identity() {
        let original =
            EvaluationRecord::create(&draft(vec![RowInput::new("a", "b", "c", 1, 1)]), now())
                .unwrap();
        let later = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        let mut edit = RecordDraft::from_record(&original);
        edit.rows.push(RowInput::new("d", "e", "f", 5, 50));

        let revised = original.revise(&edit, later).unwrap();
        assert_eq!(revised.id, original.id);
        assert_eq!(revised.created_at, original.created_at);
        assert_eq!(revised.updated_at, later);
        assert_eq!(revised.rows.len(), 2);
        assert_eq!(original.rows.len(), 1, "original is not mutated");
    }

    #[test]
    fn test_stored_json_uses_wire_names() {
        let record = EvaluationRecord::create(
            &draft(vec![RowInput::new("a", "b", "c", 5, 50).with_responsible("Luis")]),
            now(),
        )
        .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("ipercId").is_some());
        assert!(json.get("createdAt").is_some());
        let row = &json["rows"][0];
        assert_eq!(row["mr"], 250);
        assert_eq!(row["riskColor"], "#ff6b6b");
        assert_eq!(row["riskLevel"], "CRÍTICO");
        assert_eq!(row["responsible"], "Luis");
    }

    #[test]
    fn test_deserialize_recomputes_derived_fields() {
        let json = r##"{
            "activity": "Cortar", "hazard": "Filo", "consequence": "Corte",
            "probability": 2, "severity": 5,
            "mr": 999, "riskColor": "#000000", "riskLevel": "BAJO"
        }"##;
        let row: HazardRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.magnitude(), 10);
        assert_eq!(row.risk_level(), RiskLevel::Medium);
        assert_eq!(row.risk_color(), "#ffd700");
    }

    #[test]
    fn test_has_responsible_is_case_insensitive() {
        let record = EvaluationRecord::create(
            &draft(vec![
                RowInput::new("a", "b", "c", 1, 1).with_responsible("María Pérez"),
                RowInput::new("d", "e", "f", 1, 1),
            ]),
            now(),
        )
        .unwrap();
        assert!(record.has_responsible("maría pérez"));
        assert!(record.has_responsible(" MARÍA PÉREZ "));
        assert!(!record.has_responsible("Juan"));
        assert!(!record.has_responsible(""));
    }

    #[test]
    fn test_worst_level() {
        let record = EvaluationRecord::create(
            &draft(vec![
                RowInput::new("a", "b", "c", 1, 1),
                RowInput::new("d", "e", "f", 2, 20),
            ]),
            now(),
        )
        .unwrap();
        assert_eq!(record.worst_level(), Some(RiskLevel::High));
    }
}
