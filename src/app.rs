use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::chart::{metric_title, RangeBar, StackedBar};
use crate::error::RosterError;
use crate::models::{DisplayMetric, InterpretationMode, SignalResult, StudentRecord, Theme};
use crate::narrative::{compose_narrative, fmt1, Narrative};
use crate::signal::compute_signal;
use crate::synth::{synthesize, BoxSummary};

/// Everything a render depends on. Each user event yields a new state; the
/// previous one is never mutated.
#[derive(Debug, Clone)]
pub struct AppState {
    roster: Arc<[StudentRecord]>,
    selected: usize,
    pub mode: InterpretationMode,
    pub metric: DisplayMetric,
    pub theme: Theme,
}

impl AppState {
    /// Starts on the first record, like the initial page load.
    pub fn new(roster: Vec<StudentRecord>) -> Result<Self, RosterError> {
        if roster.is_empty() {
            return Err(RosterError::Empty);
        }
        Ok(Self {
            roster: roster.into(),
            selected: 0,
            mode: InterpretationMode::default(),
            metric: DisplayMetric::default(),
            theme: Theme::default(),
        })
    }

    pub fn roster(&self) -> &[StudentRecord] {
        &self.roster
    }

    pub fn selected(&self) -> &StudentRecord {
        &self.roster[self.selected]
    }

    pub fn select(&self, id: &str) -> Result<Self, RosterError> {
        let selected = self
            .roster
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| RosterError::UnknownRecord(id.to_string()))?;
        Ok(Self {
            selected,
            ..self.clone()
        })
    }

    pub fn with_mode(&self, mode: InterpretationMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_metric(&self, metric: DisplayMetric) -> Self {
        Self {
            metric,
            ..self.clone()
        }
    }

    pub fn with_theme(&self, theme: Theme) -> Self {
        Self {
            theme,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
    pub caption: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionChart {
    pub title: &'static str,
    pub samples: Vec<f64>,
    pub summary: Option<BoxSummary>,
    pub student_score: f64,
    pub mean: f64,
}

/// One full render cycle, handed to whatever draws it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub record_id: String,
    pub name: String,
    pub course: String,
    pub mode: InterpretationMode,
    pub metric: DisplayMetric,
    pub theme: Theme,
    pub summary: Vec<SummaryRow>,
    pub note: Option<String>,
    pub signal: SignalResult,
    pub narrative: Narrative,
    pub distribution: DistributionChart,
    pub stacked_bar: StackedBar,
    pub range_bar: RangeBar,
}

pub fn summary_rows(record: &StudentRecord) -> Vec<SummaryRow> {
    vec![
        SummaryRow {
            label: "Course",
            value: record.course.clone(),
            caption: "(example)",
        },
        SummaryRow {
            label: "Rank grade",
            value: format!("grade {}", record.rank_grade),
            caption: "relative ranking",
        },
        SummaryRow {
            label: "Achievement",
            value: record.achievement.to_string(),
            caption: "criterion-referenced",
        },
        SummaryRow {
            label: "Raw score / mean",
            value: format!("{} / {}", fmt1(record.raw_score), fmt1(record.mean)),
            caption: "read against the mean",
        },
        SummaryRow {
            label: "A ratio",
            value: format!("{}%", fmt1(record.a_ratio)),
            caption: "A scarce or plentiful",
        },
        SummaryRow {
            label: "AB ratio",
            value: format!("{}%", fmt1(record.ab_ratio)),
            caption: "upper tier thickness",
        },
        SummaryRow {
            label: "Students",
            value: format!("{} students", record.students),
            caption: "distribution reliability",
        },
    ]
}

pub fn render<R: Rng>(state: &AppState, rng: &mut R) -> RenderFrame {
    let record = state.selected();
    let signal = compute_signal(record, state.mode);
    let narrative = compose_narrative(record, &signal, state.mode);
    let samples = synthesize(record, rng);
    debug!(
        id = %record.id,
        mode = %state.mode,
        score = signal.score,
        samples = samples.len(),
        "rendered frame"
    );

    RenderFrame {
        record_id: record.id.clone(),
        name: record.name.clone(),
        course: record.course.clone(),
        mode: state.mode,
        metric: state.metric,
        theme: state.theme,
        summary: summary_rows(record),
        note: record.note.clone(),
        signal,
        narrative,
        distribution: DistributionChart {
            title: metric_title(state.metric),
            summary: BoxSummary::from_samples(&samples),
            samples,
            student_score: record.raw_score,
            mean: record.mean,
        },
        stacked_bar: StackedBar::from_ratios(record.a_ratio, record.ab_ratio),
        range_bar: RangeBar::from_deviation(signal.deviation),
    }
}
