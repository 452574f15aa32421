//! Field and cross-field rules for course payloads.

use std::fmt;

use url::Url;

use crate::models::{CourseRequest, NewCourse};

pub const LINK_MAX_LENGTH: usize = 1000;
pub const TARGET_AUDIENCE_MAX_LENGTH: usize = 2000;
pub const DESCRIPTION_MAX_LENGTH: usize = 2000;

/// One broken rule, carrying its user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub message: &'static str,
}

impl Violation {
    const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

/// Checks every rule against `candidate` and collects all violations in field order.
///
/// Nothing is normalized: on success the returned [`NewCourse`] carries the
/// submitted values unchanged.
pub fn validate(candidate: CourseRequest) -> Result<NewCourse, Vec<Violation>> {
    let mut violations = Vec::new();

    if is_blank(candidate.title.as_deref()) {
        violations.push(Violation::new("title must not be blank"));
    }
    if is_blank(candidate.organizer.as_deref()) {
        violations.push(Violation::new("organizer must not be blank"));
    }
    if let (Some(start), Some(end)) = (candidate.start_date, candidate.end_date) {
        if start >= end {
            violations.push(Violation::new(
                "The start date must not be equal or before the end date",
            ));
        }
    }
    if candidate.course_type.is_none() {
        violations.push(Violation::new("courseType must not be null"));
    }
    if exceeds(candidate.target_audience.as_deref(), TARGET_AUDIENCE_MAX_LENGTH) {
        violations.push(Violation::new(
            "targetAudience length must be between 0 and 2000",
        ));
    }
    if exceeds(candidate.description.as_deref(), DESCRIPTION_MAX_LENGTH) {
        violations.push(Violation::new(
            "description length must be between 0 and 2000",
        ));
    }
    if let Some(link) = candidate.link.as_deref().filter(|l| !l.is_empty()) {
        violations.extend(check_link(link));
    }

    match (candidate.title, candidate.organizer, candidate.course_type) {
        (Some(title), Some(organizer), Some(course_type)) if violations.is_empty() => Ok(NewCourse {
            title,
            organizer,
            contact_person: candidate.contact_person,
            start_date: candidate.start_date,
            end_date: candidate.end_date,
            course_form: candidate.course_form,
            course_type,
            execution_type: candidate.execution_type,
            address: candidate.address,
            target_audience: candidate.target_audience,
            description: candidate.description,
            price: candidate.price,
            link: candidate.link,
            category_names: candidate.category_names.unwrap_or_default(),
        }),
        _ => Err(violations),
    }
}

/// Joins violation messages for the error envelope.
pub fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message)
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_link(link: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    match scheme_of(link) {
        Some(scheme)
            if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") =>
        {
            violations.push(Violation::new("link protocol must be \"http\" or \"https\""));
        }
        _ if Url::parse(link).is_err() => {
            violations.push(Violation::new("link must be a valid URL"));
        }
        _ => {}
    }
    if exceeds(Some(link), LINK_MAX_LENGTH) {
        violations.push(Violation::new("link length must be between 0 and 1000"));
    }

    violations
}

/// Returns the text before the first `:` when it is a syntactically valid scheme.
fn scheme_of(link: &str) -> Option<&str> {
    let (scheme, _) = link.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    (first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')))
    .then_some(scheme)
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|s| s.trim().is_empty())
}

// Lengths are counted in characters, not bytes.
fn exceeds(value: Option<&str>, max: usize) -> bool {
    value.is_some_and(|s| s.chars().count() > max)
}
