use std::fmt::Write;

use crate::models::{Course, DashboardMetrics};

fn course_dates(course: &Course) -> String {
    match (course.start(), course.end()) {
        (Some(start), Some(end)) if course.is_multi_day() => format!("{start} to {end}"),
        (Some(start), _) => start.to_string(),
        (None, _) => "no date".to_string(),
    }
}

fn course_line(course: &Course) -> String {
    let mut line = format!(
        "- {} ({})",
        course.title.as_deref().unwrap_or(course.id.as_str()),
        course_dates(course)
    );
    if let Some(price) = course.price {
        let _ = write!(line, ", price {price}");
    }
    if let Some(seats) = course.max_participants {
        let _ = write!(line, ", {seats} seats");
    }
    line
}

pub fn build_report(metrics: &DashboardMetrics) -> String {
    let mut output = String::new();
    let counts = &metrics.counts;

    let _ = writeln!(output, "# Course Dashboard");
    let _ = writeln!(output, "Generated for {}", metrics.reference_date);
    let _ = writeln!(output);

    if metrics.is_empty {
        let _ = writeln!(output, "No courses or participants recorded yet.");
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Teachers: {}", counts.teachers);
    let _ = writeln!(output, "- Participants: {}", counts.participants);
    let _ = writeln!(output, "- Rooms: {}", counts.rooms);
    let _ = writeln!(
        output,
        "- Courses: {} ({} active)",
        counts.courses,
        metrics.active_count()
    );
    let _ = writeln!(
        output,
        "- Enrollments: {} ({}% paid)",
        counts.enrollments,
        metrics.payment_rate()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Payments");
    let _ = writeln!(
        output,
        "- {} paid, {} pending ({}%)",
        metrics.payment.paid, metrics.payment.pending, metrics.payment.rate
    );
    let _ = writeln!(output, "- Revenue from paid enrollments: {}", metrics.total_revenue);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Enrollments per Month");
    let _ = writeln!(output, "| Month | Enrollments | Paid |");
    let _ = writeln!(output, "|---|---:|---:|");
    for bucket in &metrics.monthly_buckets {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            bucket.month, bucket.total, bucket.paid
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Running Courses");
    if metrics.active_courses.is_empty() {
        let _ = writeln!(output, "No course is running on this day.");
    } else {
        for course in &metrics.active_courses {
            let _ = writeln!(output, "{}", course_line(course));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Next Courses");
    if metrics.upcoming_courses.is_empty() {
        let _ = writeln!(output, "No upcoming courses scheduled.");
    } else {
        for course in &metrics.upcoming_courses {
            let _ = writeln!(output, "{}", course_line(course));
        }
    }

    output
}
