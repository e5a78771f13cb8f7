//! Reads course and enrollment exports from disk.
//!
//! JSON files hold an array of records in the same shape the engine uses.
//! CSV files carry one record per row; an enrollment's course references go
//! into a single `courseRef` column separated by `;`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{Course, Enrollment, RecordId};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unsupported file format for {} (expected .json or .csv)", .path.display())]
    UnsupportedFormat { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    fn detect(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub courses: Vec<Course>,
    pub enrollments: Vec<Enrollment>,
}

pub fn load_dataset(courses_path: &Path, enrollments_path: &Path) -> Result<Dataset, LoadError> {
    let dataset = Dataset {
        courses: load_courses(courses_path)?,
        enrollments: load_enrollments(enrollments_path)?,
    };
    info!(
        courses = dataset.courses.len(),
        enrollments = dataset.enrollments.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

pub fn load_courses(path: &Path) -> Result<Vec<Course>, LoadError> {
    let courses = match FileFormat::detect(path)? {
        FileFormat::Json => read_json(path)?,
        FileFormat::Csv => read_csv::<CsvCourse>(path)?
            .into_iter()
            .map(Course::from)
            .collect(),
    };
    debug!(path = %path.display(), count = courses.len(), "courses read");
    Ok(courses)
}

pub fn load_enrollments(path: &Path) -> Result<Vec<Enrollment>, LoadError> {
    let enrollments = match FileFormat::detect(path)? {
        FileFormat::Json => read_json(path)?,
        FileFormat::Csv => read_csv::<CsvEnrollment>(path)?
            .into_iter()
            .map(Enrollment::from)
            .collect(),
    };
    debug!(path = %path.display(), count = enrollments.len(), "enrollments read");
    Ok(enrollments)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), LoadError> {
    let body = serde_json::to_string_pretty(value).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, body).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result.map_err(csv_error)?);
    }
    Ok(rows)
}

/// CSV row for a course. Numeric columns stay text so a bad cell only
/// blanks that field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvCourse {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    max_participants: Option<String>,
}

impl From<CsvCourse> for Course {
    fn from(row: CsvCourse) -> Self {
        Course {
            id: RecordId::new(row.id),
            title: non_empty(row.title),
            start_date: non_empty(row.start_date),
            end_date: non_empty(row.end_date),
            price: row
                .price
                .as_deref()
                .and_then(|value| Decimal::from_str(value).ok()),
            max_participants: row
                .max_participants
                .as_deref()
                .and_then(|value| value.parse().ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvEnrollment {
    id: String,
    #[serde(default)]
    course_ref: Option<String>,
    #[serde(default)]
    paid: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<CsvEnrollment> for Enrollment {
    fn from(row: CsvEnrollment) -> Self {
        let course_ref = row
            .course_ref
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect();

        Enrollment {
            id: RecordId::new(row.id),
            course_ref,
            paid: row.paid.as_deref().is_some_and(parse_flag),
            created_at: non_empty(row.created_at),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "ja"
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_json_courses() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "courses.json",
            r#"[{"id": "k1", "title": "Yoga", "startDate": "2024-01-10", "price": 120.5, "maxParticipants": 12},
                {"id": "k2"}]"#,
        );

        let courses = load_courses(&path).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].price, Some(Decimal::new(1205, 1)));
        assert_eq!(courses[0].max_participants, Some(12));
        assert_eq!(courses[1].start_date, None);
    }

    #[test]
    fn loads_csv_courses_leniently() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "courses.csv",
            "id,title,startDate,endDate,price,maxParticipants\n\
             k1,Yoga,2024-01-10,2024-01-12,99.90,15\n\
             k2,,2024-02-01,,n/a,many\n",
        );

        let courses = load_courses(&path).unwrap();
        assert_eq!(courses[0].price, Some(Decimal::new(9990, 2)));
        assert_eq!(courses[0].end_date.as_deref(), Some("2024-01-12"));
        assert_eq!(courses[1].title, None);
        assert_eq!(courses[1].end_date, None);
        assert_eq!(courses[1].price, None);
        assert_eq!(courses[1].max_participants, None);
    }

    #[test]
    fn loads_csv_enrollments_with_multiple_refs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "enrollments.csv",
            "id,courseRef,paid,createdAt\n\
             a1,k1;k2,true,2024-01-15T09:00:00\n\
             a2,,false,\n\
             a3, k3 ,1,2024-02-01\n",
        );

        let enrollments = load_enrollments(&path).unwrap();
        assert_eq!(enrollments.len(), 3);
        assert_eq!(enrollments[0].course_ref.len(), 2);
        assert!(enrollments[0].paid);
        assert!(enrollments[1].course_ref.is_empty());
        assert!(!enrollments[1].paid);
        assert_eq!(enrollments[1].created_at, None);
        assert!(enrollments[2].references(&RecordId::from("k3")));
        assert!(enrollments[2].paid);
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_courses(Path::new("courses.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn reports_missing_file_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = load_enrollments(&path).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "enrollments.json", "{not json");

        let err = load_enrollments(&path).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }

    #[test]
    fn written_json_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enrollments.json");
        let enrollments = vec![Enrollment {
            id: "a1".into(),
            course_ref: ["k1", "k2"].into_iter().collect(),
            paid: true,
            created_at: Some("2024-03-01".to_string()),
        }];

        write_json(&path, &enrollments).unwrap();
        assert_eq!(load_enrollments(&path).unwrap(), enrollments);
    }
}
