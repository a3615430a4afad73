use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::app::RenderFrame;
use crate::models::{InterpretationMode, ReliabilityTier};
use crate::narrative::{fmt1, mode_name};

#[derive(Debug, Clone, PartialEq)]
pub struct TierSummary {
    pub tier: ReliabilityTier,
    pub count: usize,
    pub avg_score: f64,
}

pub fn summarize_by_tier(frames: &[RenderFrame]) -> Vec<TierSummary> {
    let mut summaries: Vec<TierSummary> = Vec::new();

    for frame in frames {
        let tier = frame.signal.reliability.tier;
        match summaries.iter_mut().find(|summary| summary.tier == tier) {
            Some(summary) => {
                summary.avg_score += frame.signal.score;
                summary.count += 1;
            }
            None => summaries.push(TierSummary {
                tier,
                count: 1,
                avg_score: frame.signal.score,
            }),
        }
    }

    for summary in summaries.iter_mut() {
        summary.avg_score /= summary.count as f64;
    }
    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

/// Plain-text rendering of one frame for the terminal.
pub fn render_text(frame: &RenderFrame) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{} · {} [{}]", frame.name, frame.course, frame.narrative.mode_name);
    let _ = writeln!(output);
    for row in &frame.summary {
        let _ = writeln!(output, "  {:<18} {:<16} {}", row.label, row.value, row.caption);
    }
    if let Some(note) = &frame.note {
        let _ = writeln!(output, "  Note: {note}");
    }

    let _ = writeln!(output);
    for block in &frame.narrative.reason_blocks {
        let _ = writeln!(output, "{}", block.title);
        for bullet in &block.bullets {
            let _ = writeln!(output, "  - {bullet}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "{}", frame.narrative.summary_line);
    let _ = writeln!(output, "{}", frame.narrative.verdict_body);

    let _ = writeln!(output);
    let chart = &frame.distribution;
    let _ = writeln!(output, "{} ({} synthetic scores)", chart.title, chart.samples.len());
    if let Some(summary) = chart.summary {
        let _ = writeln!(
            output,
            "  min {} | q1 {} | median {} | q3 {} | max {}",
            fmt1(summary.min),
            fmt1(summary.q1),
            fmt1(summary.median),
            fmt1(summary.q3),
            fmt1(summary.max)
        );
    }
    let _ = writeln!(
        output,
        "  student {} | mean {}",
        fmt1(chart.student_score),
        fmt1(chart.mean)
    );
    let _ = writeln!(
        output,
        "  A {}% | B {}% | other {}%",
        fmt1(frame.stacked_bar.a),
        fmt1(frame.stacked_bar.b),
        fmt1(frame.stacked_bar.other)
    );
    let _ = writeln!(
        output,
        "  estimated position band: {}-{} percentile (lower is better; independent of the signal score)",
        fmt1(frame.range_bar.low),
        fmt1(frame.range_bar.high)
    );

    output
}

pub fn build_report(
    mode: InterpretationMode,
    generated_at: DateTime<Utc>,
    frames: &[RenderFrame],
) -> String {
    let summaries = summarize_by_tier(frames);

    let mut output = String::new();

    let _ = writeln!(output, "# Grade Signal Report");
    let _ = writeln!(
        output,
        "Generated {} in {} mode",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        mode_name(mode)
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Scores are explanatory heuristics over synthetic distributions, not estimates."
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Reliability Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No records in this roster.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} records (avg signal {:.1})",
                summary.tier, summary.count, summary.avg_score
            );
        }
    }

    let mut ranked: Vec<&RenderFrame> = frames.iter().collect();
    ranked.sort_by(|a, b| {
        b.signal
            .score
            .partial_cmp(&a.signal.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let _ = writeln!(output);
    let _ = writeln!(output, "## Signal Ranking");

    if ranked.is_empty() {
        let _ = writeln!(output, "No records in this roster.");
    } else {
        for frame in ranked.iter() {
            let _ = writeln!(
                output,
                "- {} ({}, {}) signal {:.0}, deviation {}, reliability {}",
                frame.name,
                frame.record_id,
                frame.course,
                frame.signal.score.round(),
                fmt1(frame.signal.deviation),
                frame.signal.reliability.tier
            );
        }
    }

    for frame in frames {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {} · {}", frame.name, frame.course);
        let _ = writeln!(output);
        let _ = writeln!(output, "**{}**", frame.narrative.summary_line);
        let _ = writeln!(output);
        for block in &frame.narrative.reason_blocks {
            let _ = writeln!(output, "### {}", block.title);
            for bullet in &block.bullets {
                let _ = writeln!(output, "- {bullet}");
            }
        }
        let _ = writeln!(output);
        for line in frame.narrative.verdict_body.lines() {
            let _ = writeln!(output, "> {line}");
        }
        if let Some(note) = &frame.note {
            let _ = writeln!(output);
            let _ = writeln!(output, "_Note: {note}_");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{render, AppState};
    use crate::models::StudentRecord;
    use crate::roster::tests::sample_record;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn frames(mode: InterpretationMode) -> Vec<RenderFrame> {
        let small = StudentRecord {
            id: "s-02".to_string(),
            name: "Jules Moreno".to_string(),
            students: 90,
            note: Some("small seminar".to_string()),
            ..sample_record()
        };
        let state = AppState::new(vec![sample_record(), small])
            .unwrap()
            .with_mode(mode);
        let mut rng = StdRng::seed_from_u64(11);
        state
            .roster()
            .iter()
            .map(|record| render(&state.select(&record.id).unwrap(), &mut rng))
            .collect()
    }

    #[test]
    fn tiers_are_counted_and_averaged() {
        let frames = frames(InterpretationMode::Balanced);
        let summaries = summarize_by_tier(&frames);
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.count == 1));
        let high = summaries
            .iter()
            .find(|s| s.tier == ReliabilityTier::High)
            .unwrap();
        assert!((high.avg_score - frames[0].signal.score).abs() < 1e-9);
    }

    #[test]
    fn report_lists_every_record() {
        let generated_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let report = build_report(
            InterpretationMode::Reliability,
            generated_at,
            &frames(InterpretationMode::Reliability),
        );
        assert!(report.starts_with("# Grade Signal Report"));
        assert!(report.contains("Generated 2026-03-01 09:30 UTC in Reliability-weighted"));
        assert!(report.contains("## Signal Ranking"));
        assert!(report.contains("Avery Lee (s-01"));
        assert!(report.contains("Jules Moreno (s-02"));
        assert!(report.contains("_Note: small seminar_"));
        assert!(report.contains("### Mode focus) Reliability-weighted"));
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report(InterpretationMode::Balanced, Utc::now(), &[]);
        assert!(report.contains("No records in this roster."));
    }

    #[test]
    fn text_view_shows_chart_and_bands() {
        let frames = frames(InterpretationMode::Balanced);
        let text = render_text(&frames[0]);
        assert!(text.contains("Raw score distribution (synthetic) (250 synthetic scores)"));
        assert!(text.contains("A 15.0% | B 13.0% | other 72.0%"));
        assert!(text.contains("estimated position band: 10.0-30.0 percentile"));
    }
}
