//! Risk magnitude classification
//!
//! Global invariants enforced:
//! - Deterministic classification (pure lookup, no state)
//! - Band edges belong to the lower band (`magnitude <= upper_bound`)
//! - The last band is a catch-all for magnitudes above every explicit bound

use serde::{Deserialize, Serialize};

/// Risk level assigned to a hazard row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "BAJO")]
    Low,
    #[serde(rename = "MEDIO")]
    Medium,
    #[serde(rename = "ALTO")]
    High,
    #[serde(rename = "CRÍTICO")]
    Critical,
    #[serde(rename = "NO DEFINIDO")]
    Undefined,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "BAJO",
            RiskLevel::Medium => "MEDIO",
            RiskLevel::High => "ALTO",
            RiskLevel::Critical => "CRÍTICO",
            RiskLevel::Undefined => "NO DEFINIDO",
        }
    }

    /// Hex fill color used for the magnitude cell and legend swatch
    pub fn color_hex(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#4cd137",
            RiskLevel::Medium => "#ffd700",
            RiskLevel::High => "#ffa500",
            RiskLevel::Critical => "#ff6b6b",
            RiskLevel::Undefined => "#cccccc",
        }
    }

    /// CSS class name used by the HTML view
    pub fn css_class(&self) -> &'static str {
        match self {
            RiskLevel::Low => "verde",
            RiskLevel::Medium => "amarillo",
            RiskLevel::High => "naranja",
            RiskLevel::Critical => "rojo",
            RiskLevel::Undefined => "gris",
        }
    }

    /// Legend caption, e.g. "RIESGO ALTO"
    pub fn legend_label(&self) -> String {
        format!("RIESGO {}", self.as_str())
    }

    /// Human-readable magnitude range covered by this level
    pub fn range_label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "X <= 3",
            RiskLevel::Medium => "3 < X <= 10",
            RiskLevel::High => "10 < X <= 50",
            RiskLevel::Critical => "50 < X <= 250",
            RiskLevel::Undefined => "X > 250",
        }
    }

    /// The four explicit bands, in classifier order (catch-all excluded)
    pub fn defined() -> [RiskLevel; 4] {
        [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ]
    }

    /// Whether dark text reads better than white on this level's color
    pub fn prefers_dark_text(&self) -> bool {
        matches!(self, RiskLevel::Medium | RiskLevel::High)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the band lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskBand {
    /// Inclusive upper bound, `None` for the catch-all band
    pub upper_bound: Option<u32>,
    pub level: RiskLevel,
}

/// Band table, checked in ascending order; first match wins
pub const RISK_BANDS: [RiskBand; 5] = [
    RiskBand {
        upper_bound: Some(3),
        level: RiskLevel::Low,
    },
    RiskBand {
        upper_bound: Some(10),
        level: RiskLevel::Medium,
    },
    RiskBand {
        upper_bound: Some(50),
        level: RiskLevel::High,
    },
    RiskBand {
        upper_bound: Some(250),
        level: RiskLevel::Critical,
    },
    RiskBand {
        upper_bound: None,
        level: RiskLevel::Undefined,
    },
];

/// Result of classifying a magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskClassification {
    pub color: &'static str,
    pub level: RiskLevel,
    pub class: &'static str,
}

impl From<RiskLevel> for RiskClassification {
    fn from(level: RiskLevel) -> Self {
        RiskClassification {
            color: level.color_hex(),
            level,
            class: level.css_class(),
        }
    }
}

/// Classify a risk magnitude (probability x severity)
///
/// Bands:
/// - `<= 3`   BAJO
/// - `<= 10`  MEDIO
/// - `<= 50`  ALTO
/// - `<= 250` CRÍTICO
/// - above    NO DEFINIDO
pub fn classify(magnitude: u32) -> RiskClassification {
    let level = RISK_BANDS
        .iter()
        .find(|band| band.upper_bound.map_or(true, |bound| magnitude <= bound))
        .map(|band| band.level)
        .unwrap_or(RiskLevel::Undefined);
    RiskClassification::from(level)
}

/// Compute magnitude and classification for a probability/severity pair
pub fn score(probability: u8, severity: u8) -> (u32, RiskClassification) {
    let magnitude = u32::from(probability) * u32::from(severity);
    (magnitude, classify(magnitude))
}
