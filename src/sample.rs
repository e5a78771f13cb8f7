use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::loader::Dataset;
use crate::models::{Course, CourseRefs, Enrollment, RecordId};

fn new_id() -> RecordId {
    RecordId::new(Uuid::new_v4().simple().to_string())
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Builds a small but realistic dataset positioned around `reference`: two
/// running courses, a handful of upcoming ones, one finished course and
/// enrollments spread over the last half year.
pub fn generate(reference: NaiveDate) -> Dataset {
    // (title, start offset in days, length in days, price in cents, seats)
    let catalogue = [
        ("Hatha Yoga für Einsteiger", -3, Some(10), Some(14900), Some(12)),
        ("Excel Grundlagen", 0, None, Some(8900), Some(16)),
        ("Fotografie am Abend", 4, Some(2), Some(19900), Some(10)),
        ("Spanisch A1", 9, Some(60), Some(34900), Some(14)),
        ("Erste Hilfe Kurs", 14, None, Some(6000), Some(20)),
        ("Töpfern Wochenende", 14, Some(1), None, Some(8)),
        ("Rhetorik Intensiv", 30, Some(3), Some(42000), None),
        ("Aquarellmalerei", -90, Some(30), Some(12000), Some(9)),
    ];

    let courses: Vec<Course> = catalogue
        .iter()
        .map(|(title, offset, length, cents, seats)| {
            let start = reference + Duration::days(*offset);
            Course {
                id: new_id(),
                title: Some(title.to_string()),
                start_date: Some(iso(start)),
                end_date: length.map(|days| iso(start + Duration::days(days))),
                price: cents.map(|cents| Decimal::new(cents, 2)),
                max_participants: *seats,
            }
        })
        .collect();

    let mut enrollments = Vec::new();
    for step in 0..24i64 {
        let created = reference - Duration::days(step * 7 + 1);
        let first = &courses[step as usize % courses.len()];
        let mut refs = vec![first.id.clone()];
        if step % 6 == 0 {
            refs.push(courses[(step as usize + 3) % courses.len()].id.clone());
        }

        enrollments.push(Enrollment {
            id: new_id(),
            course_ref: refs.into_iter().collect::<CourseRefs>(),
            paid: step % 3 != 1,
            created_at: Some(format!("{}T09:30:00", iso(created))),
        });
    }

    info!(
        courses = courses.len(),
        enrollments = enrollments.len(),
        %reference,
        "sample dataset generated"
    );

    Dataset {
        courses,
        enrollments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;
    use crate::models::RosterCounts;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
    }

    #[test]
    fn sample_courses_cover_every_dashboard_panel() {
        let dataset = generate(reference());
        let result = metrics::compute(
            &dataset.courses,
            &dataset.enrollments,
            RosterCounts::default(),
            reference(),
        );

        assert_eq!(result.active_courses.len(), 2);
        assert_eq!(result.upcoming_courses.len(), metrics::UPCOMING_LIMIT);
        assert!(result.total_revenue > Decimal::ZERO);
        assert!(result.payment_rate() > 0 && result.payment_rate() < 100);
        assert!(result.monthly_buckets.iter().any(|b| b.total > 0));
    }

    #[test]
    fn sample_ids_are_unique() {
        let dataset = generate(reference());
        let mut ids: Vec<_> = dataset
            .courses
            .iter()
            .map(|c| c.id.clone())
            .chain(dataset.enrollments.iter().map(|e| e.id.clone()))
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
