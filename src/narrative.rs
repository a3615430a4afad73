//! Mode-dependent explanatory text. Pure formatting over a `SignalResult`;
//! no numbers are derived here beyond rounding for display.

use serde::Serialize;

use crate::models::{InterpretationMode, SignalResult, StudentRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonBlock {
    pub title: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub mode_name: &'static str,
    pub summary_line: String,
    pub reason_blocks: Vec<ReasonBlock>,
    pub verdict_body: String,
}

pub fn mode_name(mode: InterpretationMode) -> &'static str {
    match mode {
        InterpretationMode::Balanced => "Balanced reading",
        InterpretationMode::Achievement => "Achievement-first (conservative)",
        InterpretationMode::Raw => "Raw-score-first (assertive)",
        InterpretationMode::Distribution => "Distribution-sensitive (A/AB weighted)",
        InterpretationMode::Reliability => "Reliability-weighted (class size weighted)",
    }
}

/// One decimal place, halves rounded up; never prints "-0.0".
pub fn fmt1(value: f64) -> String {
    let rounded = (value * 10.0 + 0.5).floor() / 10.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.1}")
}

fn signed1(value: f64) -> String {
    if value >= 0.0 {
        format!("+{}", fmt1(value))
    } else {
        fmt1(value)
    }
}

pub fn summary_line(signal: &SignalResult) -> String {
    format!(
        "Interpretation signal (explanatory): {} / 100 · Reliability: {}",
        signal.score.round(),
        signal.reliability.tier
    )
}

pub fn compose_narrative(
    record: &StudentRecord,
    signal: &SignalResult,
    mode: InterpretationMode,
) -> Narrative {
    let mut reason_blocks = common_reasons(record, signal);
    if let Some(block) = mode_reason(mode) {
        reason_blocks.push(block);
    }

    Narrative {
        mode_name: mode_name(mode),
        summary_line: summary_line(signal),
        reason_blocks,
        verdict_body: verdict(record, signal, mode),
    }
}

fn block(title: &str, bullets: [String; 2]) -> ReasonBlock {
    ReasonBlock {
        title: title.to_string(),
        bullets: bullets.into(),
    }
}

fn common_reasons(record: &StudentRecord, signal: &SignalResult) -> Vec<ReasonBlock> {
    vec![
        block(
            "Reason 1) Raw score against the class mean",
            [
                format!(
                    "{} points vs. the mean → the grade can be read alongside the actual level of achievement",
                    signed1(signal.deviation)
                ),
                "The larger the gap above the mean, the more likely a top-tier result (check together with distribution and class size)".to_string(),
            ],
        ),
        block(
            "Reason 2) Achievement distribution (A/AB ratios)",
            [
                format!(
                    "A ratio {}% → when A is scarce, even a B may sit near the A cutoff",
                    fmt1(record.a_ratio)
                ),
                format!(
                    "AB ratio {}% → a thin upper tier makes the same score gap more meaningful",
                    fmt1(record.ab_ratio)
                ),
            ],
        ),
        block(
            "Reason 3) Reliability of the evidence (class size)",
            [
                format!(
                    "{} students (reliability: {})",
                    record.students, signal.reliability.tier
                ),
                "The larger the class, the steadier any reading based on means and ratios".to_string(),
            ],
        ),
    ]
}

fn mode_reason(mode: InterpretationMode) -> Option<ReasonBlock> {
    let (title, bullets) = match mode {
        InterpretationMode::Balanced => return None,
        InterpretationMode::Achievement => (
            "Mode focus) Achievement-first (conservative)",
            [
                "Weighs the A/B/C achievement heavily and avoids declaring a top-tier result",
                "Deviation from the mean and A/AB context serve as supporting evidence",
            ],
        ),
        InterpretationMode::Raw => (
            "Mode focus) Raw-score-first (assertive)",
            [
                "Treats the gap to the mean as the core evidence, achievement as secondary",
                "A B well above the mean can be read as effectively top tier",
            ],
        ),
        InterpretationMode::Distribution => (
            "Mode focus) Distribution-sensitive",
            [
                "Weighs A/AB ratios heavily: the same achievement means more when the top tier is scarce",
                "A B in a course where A is scarce is read more favourably",
            ],
        ),
        InterpretationMode::Reliability => (
            "Mode focus) Reliability-weighted",
            [
                "Confidence rises with class size; small classes are flagged for caution",
                "States the weight of the evidence alongside the reading to avoid overclaiming",
            ],
        ),
    };
    Some(block(title, bullets.map(str::to_string)))
}

fn verdict(record: &StudentRecord, signal: &SignalResult, mode: InterpretationMode) -> String {
    let ach = &record.achievement;
    let rank = record.rank_grade;
    let rel = signal.reliability.tier;
    let diff_text = if signal.deviation >= 0.0 {
        format!("the raw score is {} points above the mean", fmt1(signal.deviation))
    } else {
        format!("the raw score is {} points below the mean", fmt1(-signal.deviation))
    };
    let a_text = format!("the A ratio ({}%)", fmt1(record.a_ratio));
    let ab_text = format!("the AB ratio ({}%)", fmt1(record.ab_ratio));
    let n_text = format!("the class size ({} students)", record.students);

    let lines = match mode {
        InterpretationMode::Achievement => vec![
            format!("This student holds rank grade {rank} with achievement {ach}."),
            format!(
                "Given what achievement {ach} implies, rather than calling this a top-tier result, {diff_text}, and {a_text} and {ab_text} should be read as distribution context."
            ),
            format!(
                "With {n_text}, the reliability of the distribution reading is {rel}; overall this reads as evidence of steady academic achievement."
            ),
        ],
        InterpretationMode::Raw => vec![
            format!("This student holds achievement {ach}, yet {diff_text}, a clear margin over the class."),
            format!(
                "Considering {a_text} and {ab_text}, a position near the A cutoff or in the upper tier cannot be ruled out despite achievement {ach}."
            ),
            format!(
                "With {n_text}, the reliability of the distribution reading is {rel}; the underlying ability can reasonably be read as upper tier."
            ),
        ],
        InterpretationMode::Distribution => vec![
            format!(
                "The key to this reading is distribution context. Given the scarcity of the top tier shown by {a_text} and {ab_text},"
            ),
            format!(
                "achievement {ach} and rank grade {rank} need not be taken at face value; the position within the same achievement level can be reinterpreted."
            ),
            format!(
                "Since {diff_text}, and taking {n_text} into account, the distribution gives grounds for a favourable reading (emphasis differs between institutions)."
            ),
        ],
        InterpretationMode::Reliability => vec![
            format!("Since {diff_text}, this student may be read as a top performer within the distribution."),
            format!(
                "How confident that reading is depends on the evidence; here {n_text} puts reliability at {rel}."
            ),
            "The relative position is a positive signal, but a real evaluation weighs further material such as course context and teacher comments.".to_string(),
        ],
        InterpretationMode::Balanced => vec![
            format!("This student holds achievement {ach} and rank grade {rank}."),
            format!("At the same time, {diff_text}; combining {a_text}, {ab_text} and {n_text},"),
            format!("the actual level of achievement may be read as upper tier despite achievement {ach}."),
            "This view is a simulated training aid; real criteria differ between institutions and admission tracks.".to_string(),
        ],
    };

    lines.join("\n")
}
