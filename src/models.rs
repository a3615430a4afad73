use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A roster row as it arrives from JSON or CSV, before normalization.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStudentRecord {
    pub id: String,
    pub name: Option<String>,
    pub course: Option<String>,
    pub rank_grade: Option<i64>,
    pub achievement: Option<String>,
    pub raw_score: Option<f64>,
    pub mean: Option<f64>,
    pub a_ratio: Option<f64>,
    pub ab_ratio: Option<f64>,
    pub students: Option<i64>,
    pub note: Option<String>,
}

/// A fully populated record. Only `roster::normalize` builds these, so every
/// instance satisfies the range invariants and `a_ratio <= ab_ratio`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub course: String,
    pub rank_grade: u8,
    pub achievement: Achievement,
    pub raw_score: f64,
    pub mean: f64,
    pub a_ratio: f64,
    pub ab_ratio: f64,
    pub students: u32,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Achievement {
    A,
    B,
    C,
    Other(String),
}

impl Achievement {
    pub fn parse(value: &str) -> Self {
        let upper = value.trim().to_uppercase();
        match upper.as_str() {
            "A" => Achievement::A,
            "B" => Achievement::B,
            "C" => Achievement::C,
            _ => Achievement::Other(upper),
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Achievement::A => f.write_str("A"),
            Achievement::B => f.write_str("B"),
            Achievement::C => f.write_str("C"),
            Achievement::Other(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for Achievement {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InterpretationMode {
    #[default]
    Balanced,
    Achievement,
    Raw,
    Distribution,
    Reliability,
}

impl InterpretationMode {
    pub const ALL: [InterpretationMode; 5] = [
        InterpretationMode::Balanced,
        InterpretationMode::Achievement,
        InterpretationMode::Raw,
        InterpretationMode::Distribution,
        InterpretationMode::Reliability,
    ];

    /// Unknown names fall back to `Balanced`.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InterpretationMode::Balanced => "balanced",
            InterpretationMode::Achievement => "achievement",
            InterpretationMode::Raw => "raw",
            InterpretationMode::Distribution => "distribution",
            InterpretationMode::Reliability => "reliability",
        }
    }
}

impl FromStr for InterpretationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InterpretationMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown interpretation mode '{s}'"))
    }
}

impl fmt::Display for InterpretationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart metric. Only changes the chart title, never the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMetric {
    #[default]
    Raw,
    Diff,
    Ratio,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReliabilityTier {
    VeryHigh,
    High,
    Moderate,
    Caution,
}

impl ReliabilityTier {
    pub fn label(self) -> &'static str {
        match self {
            ReliabilityTier::VeryHigh => "very-high",
            ReliabilityTier::High => "high",
            ReliabilityTier::Moderate => "moderate",
            ReliabilityTier::Caution => "caution",
        }
    }
}

impl fmt::Display for ReliabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reliability {
    pub tier: ReliabilityTier,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalResult {
    pub deviation: f64,
    pub reliability: Reliability,
    pub score: f64,
}
