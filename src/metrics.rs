use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use crate::calendar;
use crate::models::{
    CollectionCounts, Course, DashboardMetrics, Enrollment, MonthKey, MonthlyBucket,
    PaymentSummary, RecordId, RosterCounts,
};

/// Length of the "next courses" list.
pub const UPCOMING_LIMIT: usize = 5;

/// Number of calendar months in the enrollment chart.
pub const MONTH_WINDOW: usize = 6;

/// Derives every dashboard figure from the raw collections.
///
/// `reference` is the calendar day the dashboard is computed for. The call
/// never fails: records missing a field (or carrying an unparsable date) are
/// left out of the figures that need that field.
pub fn compute(
    courses: &[Course],
    enrollments: &[Enrollment],
    roster: RosterCounts,
    reference: NaiveDate,
) -> DashboardMetrics {
    debug!(
        courses = courses.len(),
        enrollments = enrollments.len(),
        %reference,
        "computing dashboard metrics"
    );

    let metrics = DashboardMetrics {
        reference_date: reference,
        counts: CollectionCounts {
            teachers: roster.teachers,
            participants: roster.participants,
            rooms: roster.rooms,
            courses: courses.len(),
            enrollments: enrollments.len(),
        },
        active_courses: active_courses(courses, reference),
        upcoming_courses: upcoming_courses(courses, reference),
        payment: payment_summary(enrollments),
        total_revenue: total_revenue(courses, enrollments),
        monthly_buckets: monthly_buckets(enrollments, reference),
        is_empty: courses.is_empty() && roster.participants == 0,
    };

    debug!(
        active = metrics.active_courses.len(),
        upcoming = metrics.upcoming_courses.len(),
        payment_rate = metrics.payment.rate,
        revenue = %metrics.total_revenue,
        "dashboard metrics ready"
    );

    metrics
}

/// Same as [`compute`] with today's local date as the reference.
pub fn compute_today(
    courses: &[Course],
    enrollments: &[Enrollment],
    roster: RosterCounts,
) -> DashboardMetrics {
    compute(courses, enrollments, roster, calendar::today())
}

pub fn is_active(course: &Course, reference: NaiveDate) -> bool {
    match (course.start(), course.last_day()) {
        (Some(start), Some(last_day)) => start <= reference && reference <= last_day,
        _ => false,
    }
}

pub fn is_upcoming(course: &Course, reference: NaiveDate) -> bool {
    course.start().is_some_and(|start| start > reference)
}

pub fn active_courses(courses: &[Course], reference: NaiveDate) -> Vec<Course> {
    courses
        .iter()
        .filter(|course| is_active(course, reference))
        .cloned()
        .collect()
}

/// Courses starting after `reference`, soonest first, capped at
/// [`UPCOMING_LIMIT`]. Ordered by the raw start value, so a bare date sorts
/// before timestamps on the same day; identical values keep their input order.
pub fn upcoming_courses(courses: &[Course], reference: NaiveDate) -> Vec<Course> {
    let mut candidates: Vec<&Course> = courses
        .iter()
        .filter(|course| is_upcoming(course, reference))
        .collect();

    candidates.sort_by(|a, b| raw_start(a).cmp(raw_start(b)));
    candidates
        .into_iter()
        .take(UPCOMING_LIMIT)
        .cloned()
        .collect()
}

fn raw_start(course: &Course) -> &str {
    course.start_date.as_deref().unwrap_or_default().trim()
}

pub fn payment_summary(enrollments: &[Enrollment]) -> PaymentSummary {
    let paid = enrollments.iter().filter(|e| e.paid).count();
    PaymentSummary {
        paid,
        pending: enrollments.len() - paid,
        rate: payment_rate(paid, enrollments.len()),
    }
}

/// `paid / total` as a whole percent, rounding halves up (12.5 -> 13).
pub fn payment_rate(paid: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }

    let paid = paid.min(total) as u64;
    let total = total as u64;
    let rate = (200 * paid + total) / (2 * total);
    u8::try_from(rate).unwrap_or(100)
}

/// Sum over priced courses of price times the paid enrollments referencing
/// the course.
///
/// An enrollment referencing several courses is counted for each of them, so
/// one payment can contribute to the revenue of more than one course. A total
/// beyond the decimal range saturates at [`Decimal::MAX`].
pub fn total_revenue(courses: &[Course], enrollments: &[Enrollment]) -> Decimal {
    let mut paid_per_course: HashMap<&RecordId, u64> = HashMap::new();
    for enrollment in enrollments.iter().filter(|e| e.paid) {
        for course_id in enrollment.course_ref.iter() {
            *paid_per_course.entry(course_id).or_default() += 1;
        }
    }

    let mut total = Decimal::ZERO;
    for course in courses {
        let Some(price) = course.billable_price() else {
            continue;
        };
        let paid = paid_per_course.get(&course.id).copied().unwrap_or(0);
        let revenue = price
            .checked_mul(Decimal::from(paid))
            .and_then(|revenue| total.checked_add(revenue));

        match revenue {
            Some(sum) => total = sum,
            None => {
                warn!(course = %course.id, "revenue exceeds the decimal range, saturating");
                return Decimal::MAX;
            }
        }
    }

    total
}

/// Enrollment counts for the [`MONTH_WINDOW`] calendar months ending with the
/// reference month, oldest first. Enrollments created outside the window or
/// without a usable creation date are not counted.
pub fn monthly_buckets(enrollments: &[Enrollment], reference: NaiveDate) -> Vec<MonthlyBucket> {
    let mut buckets: Vec<MonthlyBucket> = calendar::trailing_months(reference, MONTH_WINDOW)
        .into_iter()
        .map(|month| MonthlyBucket {
            month,
            total: 0,
            paid: 0,
        })
        .collect();

    for enrollment in enrollments {
        let Some(created_on) = enrollment.created_on() else {
            trace!(enrollment = %enrollment.id, "no usable creation date, skipping");
            continue;
        };

        let month = MonthKey::of(created_on);
        if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.month == month) {
            bucket.total += 1;
            if enrollment.paid {
                bucket.paid += 1;
            }
        }
    }

    buckets
}
