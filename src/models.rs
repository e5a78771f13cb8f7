use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar;

/// Opaque record identifier as handed out by the course backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Set of courses an enrollment points at. May be empty or hold several ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseRefs(BTreeSet<RecordId>);

impl CourseRefs {
    pub fn contains(&self, id: &RecordId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.0.iter()
    }
}

impl<T: Into<RecordId>> FromIterator<T> for CourseRefs {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: RecordId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub max_participants: Option<u32>,
}

impl Course {
    pub fn start(&self) -> Option<NaiveDate> {
        self.start_date.as_deref().and_then(calendar::parse_date)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end_date.as_deref().and_then(calendar::parse_date)
    }

    /// Last day the course runs. Without a usable end date the course is a
    /// single-day course.
    pub fn last_day(&self) -> Option<NaiveDate> {
        let start = self.start()?;
        Some(self.end().unwrap_or(start))
    }

    pub fn is_multi_day(&self) -> bool {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => start != end,
            _ => false,
        }
    }

    /// Price that counts towards revenue. Zero and negative prices never do.
    pub fn billable_price(&self) -> Option<Decimal> {
        self.price.filter(|price| *price > Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_ref: CourseRefs,
    #[serde(default, deserialize_with = "null_as_default")]
    pub paid: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Enrollment {
    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created_at.as_deref().and_then(calendar::parse_date)
    }

    pub fn references(&self, course: &RecordId) -> bool {
        self.course_ref.contains(course)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sizes of the collections the engine does not otherwise look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterCounts {
    pub teachers: usize,
    pub participants: usize,
    pub rooms: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub teachers: usize,
    pub participants: usize,
    pub rooms: usize,
    pub courses: usize,
    pub enrollments: usize,
}

/// A calendar month, ordered chronologically and shown as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        Self::of(date) == self
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyBucket {
    pub month: MonthKey,
    pub total: usize,
    pub paid: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub paid: usize,
    pub pending: usize,
    /// Whole percent of paid enrollments, 0 when there are none.
    pub rate: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub reference_date: NaiveDate,
    pub counts: CollectionCounts,
    pub active_courses: Vec<Course>,
    pub upcoming_courses: Vec<Course>,
    pub payment: PaymentSummary,
    pub total_revenue: Decimal,
    pub monthly_buckets: Vec<MonthlyBucket>,
    pub is_empty: bool,
}

impl DashboardMetrics {
    pub fn payment_rate(&self) -> u8 {
        self.payment.rate
    }

    pub fn active_count(&self) -> usize {
        self.active_courses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn enrollment_accepts_null_and_missing_fields() {
        let json = r#"[
            {"id": "a1", "courseRef": ["c1", "c2"], "paid": true, "createdAt": "2024-03-02T10:00:00"},
            {"id": "a2", "courseRef": null, "paid": null},
            {"id": "a3"}
        ]"#;
        let enrollments: Vec<Enrollment> = serde_json::from_str(json).unwrap();

        assert_eq!(enrollments[0].course_ref.len(), 2);
        assert!(enrollments[0].references(&RecordId::from("c2")));
        assert_eq!(enrollments[0].created_on(), Some(date(2024, 3, 2)));
        assert!(enrollments[1].course_ref.is_empty());
        assert!(!enrollments[1].paid);
        assert!(!enrollments[2].paid);
        assert_eq!(enrollments[2].created_on(), None);
    }

    #[test]
    fn course_without_end_is_single_day() {
        let course = Course {
            id: "c1".into(),
            start_date: Some("2024-01-10".to_string()),
            ..Course::default()
        };
        assert_eq!(course.last_day(), Some(date(2024, 1, 10)));
        assert!(!course.is_multi_day());
    }

    #[test]
    fn unparsable_end_falls_back_to_start() {
        let course = Course {
            id: "c1".into(),
            start_date: Some("2024-01-10".to_string()),
            end_date: Some("soon".to_string()),
            ..Course::default()
        };
        assert_eq!(course.last_day(), Some(date(2024, 1, 10)));
    }

    #[test]
    fn only_positive_prices_are_billable() {
        let mut course = Course {
            id: "c1".into(),
            price: Some(Decimal::new(-5, 0)),
            ..Course::default()
        };
        assert_eq!(course.billable_price(), None);
        course.price = Some(Decimal::ZERO);
        assert_eq!(course.billable_price(), None);
        course.price = Some(Decimal::new(1995, 2));
        assert_eq!(course.billable_price(), Some(Decimal::new(1995, 2)));
    }

    #[test]
    fn month_key_steps_back_across_years() {
        let january = MonthKey::of(date(2024, 1, 31));
        assert_eq!(january.previous(), MonthKey { year: 2023, month: 12 });
        assert_eq!(january.to_string(), "2024-01");
        assert!(january.contains(date(2024, 1, 1)));
        assert!(!january.contains(date(2023, 1, 1)));
    }

    #[test]
    fn month_key_serializes_as_string() {
        let key = MonthKey { year: 2024, month: 6 };
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-06\"");
    }
}
