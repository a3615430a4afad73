use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::RosterError;
use crate::models::{Achievement, RawStudentRecord, StudentRecord};

pub const DEFAULT_A_RATIO: f64 = 20.0;
pub const DEFAULT_AB_RATIO: f64 = 30.0;

/// One-shot load of the roster. JSON unless the file ends in `.csv`.
pub async fn load_roster(path: &Path) -> Result<Vec<StudentRecord>, RosterError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let raw = if is_csv(path) {
        parse_csv(contents.as_bytes())?
    } else {
        parse_json(&contents)?
    };
    debug!(rows = raw.len(), path = %path.display(), "parsed roster");

    let records = normalize_roster(raw)?;
    info!(records = records.len(), path = %path.display(), "roster loaded");
    Ok(records)
}

pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

pub fn parse_json(contents: &str) -> Result<Vec<RawStudentRecord>, RosterError> {
    Ok(serde_json::from_str(contents)?)
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawStudentRecord>, RosterError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawStudentRecord>() {
        rows.push(result?);
    }
    Ok(rows)
}

pub fn normalize_roster(raw: Vec<RawStudentRecord>) -> Result<Vec<StudentRecord>, RosterError> {
    if raw.is_empty() {
        return Err(RosterError::Empty);
    }

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(raw.len());
    for row in raw {
        let record = normalize(row)?;
        if !seen.insert(record.id.clone()) {
            return Err(RosterError::DuplicateId(record.id));
        }
        records.push(record);
    }
    Ok(records)
}

/// The single ingestion boundary: required fields are checked, optional
/// ratios defaulted, out-of-range values clamped. AB is treated as
/// cumulative, so `ab_ratio` is lifted to `a_ratio` when it is smaller.
pub fn normalize(raw: RawStudentRecord) -> Result<StudentRecord, RosterError> {
    let id = raw.id.trim().to_string();
    if id.is_empty() {
        return Err(RosterError::InvalidField {
            id: raw.id,
            field: "id",
            reason: "must not be empty".to_string(),
        });
    }

    let name = non_empty(&id, "name", required(&id, "name", raw.name)?)?;
    let course = non_empty(&id, "course", required(&id, "course", raw.course)?)?;

    let raw_score = bounded(&id, "raw_score", required(&id, "raw_score", raw.raw_score)?, 0.0, 100.0)?;
    let mean = bounded(&id, "mean", required(&id, "mean", raw.mean)?, 0.0, 100.0)?;
    let a_ratio = bounded(&id, "a_ratio", raw.a_ratio.unwrap_or(DEFAULT_A_RATIO), 0.0, 100.0)?;
    let mut ab_ratio = bounded(&id, "ab_ratio", raw.ab_ratio.unwrap_or(DEFAULT_AB_RATIO), 0.0, 100.0)?;
    if a_ratio > ab_ratio {
        warn!(id = %id, a_ratio, ab_ratio, "ab_ratio below a_ratio, lifting to a_ratio");
        ab_ratio = a_ratio;
    }

    let students = required(&id, "students", raw.students)?;
    if students < 1 {
        return Err(RosterError::InvalidField {
            id,
            field: "students",
            reason: format!("must be at least 1, got {students}"),
        });
    }
    let students = u32::try_from(students).unwrap_or_else(|_| {
        warn!(id = %id, students, "students above {}, clamping", u32::MAX);
        u32::MAX
    });

    let rank_grade = required(&id, "rank_grade", raw.rank_grade)?;
    if !(1..=6).contains(&rank_grade) {
        warn!(id = %id, rank_grade, "rank_grade outside 1-6, clamping");
    }
    let rank_grade = rank_grade.clamp(1, 6) as u8;

    let achievement = required(&id, "achievement", raw.achievement)?;
    let achievement = Achievement::parse(&achievement);
    if let Achievement::Other(value) = &achievement {
        warn!(id = %id, achievement = %value, "unrecognized achievement, scored as below B");
    }

    let note = raw.note.filter(|note| !note.trim().is_empty());

    Ok(StudentRecord {
        id,
        name,
        course,
        rank_grade,
        achievement,
        raw_score,
        mean,
        a_ratio,
        ab_ratio,
        students,
        note,
    })
}

fn required<T>(id: &str, field: &'static str, value: Option<T>) -> Result<T, RosterError> {
    value.ok_or_else(|| RosterError::MissingField {
        id: id.to_string(),
        field,
    })
}

fn non_empty(id: &str, field: &'static str, value: String) -> Result<String, RosterError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(RosterError::InvalidField {
            id: id.to_string(),
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(value)
}

fn bounded(id: &str, field: &'static str, value: f64, lo: f64, hi: f64) -> Result<f64, RosterError> {
    if !value.is_finite() {
        return Err(RosterError::InvalidField {
            id: id.to_string(),
            field,
            reason: format!("{value} is not a finite number"),
        });
    }
    if value < lo || value > hi {
        warn!(id = %id, field, value, "value outside [{lo}, {hi}], clamping");
    }
    Ok(value.clamp(lo, hi))
}

/// Demonstration roster written by `seed`.
pub fn demo_roster() -> Vec<RawStudentRecord> {
    let rows = [
        ("s-01", "Student A", "Mathematics II", 2, "B", 88.0, 75.0, 15.0, 28.0, 250, "B with a thin top tier and a large class"),
        ("s-02", "Student B", "Physics I", 1, "A", 94.5, 68.2, 12.4, 31.0, 312, "Clear top performer in a demanding course"),
        ("s-03", "Student C", "World History", 3, "B", 79.0, 76.5, 34.0, 58.0, 140, "Generous grading, score close to the mean"),
        ("s-04", "Student D", "Chemistry I", 4, "C", 61.0, 64.0, 9.0, 19.0, 90, "Small class, below the mean"),
        ("s-05", "Student E", "English Literature", 2, "A", 91.0, 83.0, 41.0, 66.0, 205, "A is common in this course"),
    ];

    rows.into_iter()
        .map(
            |(id, name, course, rank_grade, achievement, raw_score, mean, a_ratio, ab_ratio, students, note)| {
                RawStudentRecord {
                    id: id.to_string(),
                    name: Some(name.to_string()),
                    course: Some(course.to_string()),
                    rank_grade: Some(rank_grade),
                    achievement: Some(achievement.to_string()),
                    raw_score: Some(raw_score),
                    mean: Some(mean),
                    a_ratio: Some(a_ratio),
                    ab_ratio: Some(ab_ratio),
                    students: Some(students),
                    note: Some(note.to_string()),
                }
            },
        )
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_raw() -> RawStudentRecord {
        RawStudentRecord {
            id: "s-01".to_string(),
            name: Some("Avery Lee".to_string()),
            course: Some("Mathematics II".to_string()),
            rank_grade: Some(2),
            achievement: Some("b".to_string()),
            raw_score: Some(88.0),
            mean: Some(75.0),
            a_ratio: Some(15.0),
            ab_ratio: Some(28.0),
            students: Some(250),
            note: None,
        }
    }

    pub(crate) fn sample_record() -> StudentRecord {
        normalize(sample_raw()).unwrap()
    }

    #[test]
    fn normalizes_a_complete_row() {
        let record = sample_record();
        assert_eq!(record.achievement, Achievement::B);
        assert_eq!(record.rank_grade, 2);
        assert_eq!(record.students, 250);
        assert_eq!(record.ab_ratio, 28.0);
    }

    #[test]
    fn missing_ratios_take_defaults() {
        let raw = RawStudentRecord {
            a_ratio: None,
            ab_ratio: None,
            ..sample_raw()
        };
        let record = normalize(raw).unwrap();
        assert_eq!(record.a_ratio, DEFAULT_A_RATIO);
        assert_eq!(record.ab_ratio, DEFAULT_AB_RATIO);
    }

    #[test]
    fn missing_mean_is_rejected() {
        let raw = RawStudentRecord {
            mean: None,
            ..sample_raw()
        };
        let err = normalize(raw).unwrap_err();
        assert!(matches!(err, RosterError::MissingField { field: "mean", .. }));
    }

    #[test]
    fn name_and_course_are_required() {
        let json = r#"[{"id":"x","rank_grade":3,"achievement":"A",
            "raw_score":70,"mean":65,"students":150}]"#;
        let err = normalize_roster(parse_json(json).unwrap()).unwrap_err();
        assert!(matches!(err, RosterError::MissingField { field: "name", .. }));

        let raw = RawStudentRecord {
            course: Some("   ".to_string()),
            ..sample_raw()
        };
        assert!(matches!(
            normalize(raw),
            Err(RosterError::InvalidField { field: "course", .. })
        ));
    }

    #[test]
    fn oversized_class_saturates() {
        let raw = RawStudentRecord {
            students: Some(i64::from(u32::MAX) + 10),
            ..sample_raw()
        };
        assert_eq!(normalize(raw).unwrap().students, u32::MAX);
    }

    #[test]
    fn non_finite_and_empty_class_are_rejected() {
        let raw = RawStudentRecord {
            raw_score: Some(f64::NAN),
            ..sample_raw()
        };
        assert!(matches!(
            normalize(raw),
            Err(RosterError::InvalidField { field: "raw_score", .. })
        ));

        let raw = RawStudentRecord {
            students: Some(0),
            ..sample_raw()
        };
        assert!(matches!(
            normalize(raw),
            Err(RosterError::InvalidField { field: "students", .. })
        ));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let raw = RawStudentRecord {
            raw_score: Some(104.0),
            rank_grade: Some(9),
            a_ratio: Some(-3.0),
            ..sample_raw()
        };
        let record = normalize(raw).unwrap();
        assert_eq!(record.raw_score, 100.0);
        assert_eq!(record.rank_grade, 6);
        assert_eq!(record.a_ratio, 0.0);
    }

    #[test]
    fn ab_ratio_is_lifted_to_a_ratio() {
        let raw = RawStudentRecord {
            a_ratio: Some(45.0),
            ab_ratio: Some(10.0),
            ..sample_raw()
        };
        let record = normalize(raw).unwrap();
        assert_eq!(record.a_ratio, 45.0);
        assert_eq!(record.ab_ratio, 45.0);
    }

    #[test]
    fn duplicate_ids_and_empty_rosters_fail() {
        let err = normalize_roster(vec![sample_raw(), sample_raw()]).unwrap_err();
        assert!(matches!(err, RosterError::DuplicateId(id) if id == "s-01"));
        assert!(matches!(normalize_roster(Vec::new()), Err(RosterError::Empty)));
    }

    #[test]
    fn parses_json_with_missing_optionals() {
        let json = r#"[{"id":"x","name":"N","course":"C","rank_grade":3,
            "achievement":"A","raw_score":70,"mean":65,"students":150}]"#;
        let rows = parse_json(json).unwrap();
        let records = normalize_roster(rows).unwrap();
        assert_eq!(records[0].a_ratio, DEFAULT_A_RATIO);
        assert_eq!(records[0].note, None);
    }

    #[test]
    fn parses_csv_with_blank_ratio_columns() {
        let data = "id,name,course,rank_grade,achievement,raw_score,mean,a_ratio,ab_ratio,students,note\n\
                    c-1,Jules Moreno,Biology,2,a,82.5,71,,,180,\n";
        let rows = parse_csv(data.as_bytes()).unwrap();
        let records = normalize_roster(rows).unwrap();
        assert_eq!(records[0].achievement, Achievement::A);
        assert_eq!(records[0].ab_ratio, DEFAULT_AB_RATIO);
        assert_eq!(records[0].note, None);
    }

    #[test]
    fn demo_roster_normalizes_cleanly() {
        let records = normalize_roster(demo_roster()).unwrap();
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.a_ratio <= r.ab_ratio));
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let err = load_roster(Path::new("does/not/exist.json")).await.unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
