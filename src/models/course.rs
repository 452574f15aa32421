use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Raised when a free-text enum literal does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Cannot deserialize value of type `{type_name}` from String \"{value}\": not one of the values accepted for Enum class: [{}]",
    .accepted.join(", ")
)]
pub struct UnknownVariant {
    pub type_name: &'static str,
    pub value: String,
    pub accepted: &'static [&'static str],
}

/// Declares a closed enum stored and serialized as its upper-case symbolic name.
///
/// Deserialization goes through `TryFrom<String>` so an unknown literal is
/// reported with the type name and the accepted values.
macro_rules! symbolic_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $literal:tt),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[serde(try_from = "String")]
        pub enum $name {
            $(
                #[serde(rename = $literal)]
                #[sqlx(rename = $literal)]
                $variant,
            )+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($literal),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $literal,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($literal => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        type_name: stringify!($name),
                        value: other.to_string(),
                        accepted: Self::VALUES,
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

symbolic_enum!(
    /// Format of the event.
    CourseForm {
        Seminar => "SEMINAR",
        Meetup => "MEETUP",
        Workshop => "WORKSHOP",
        StudyGroup => "STUDY_GROUP",
        Certification => "CERTIFICATION",
        Conference => "CONFERENCE",
        Lecture => "LECTURE",
        LanguageCourse => "LANGUAGE_COURSE",
    }
);

symbolic_enum!(
    CourseType {
        External => "EXTERNAL",
        Internal => "INTERNAL",
    }
);

symbolic_enum!(
    ExecutionType {
        Remote => "REMOTE",
        Onsite => "ONSITE",
    }
);

/// A stored course as returned by the read endpoints.
///
/// Carries no soft-delete flag, so it never appears in responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub organizer: String,
    pub contact_person: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub course_form: Option<CourseForm>,
    pub course_type: CourseType,
    pub execution_type: Option<ExecutionType>,
    pub address: Option<String>,
    pub target_audience: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub link: Option<String>,
    #[sqlx(skip)]
    pub category_names: Vec<String>,
}

/// Write payload for `POST /courses` and `PUT /courses/{id}`.
///
/// Every field is optional here; required fields are enforced by
/// [`crate::validation::validate`] so that all violations can be reported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub title: Option<String>,
    pub organizer: Option<String>,
    pub contact_person: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub course_form: Option<CourseForm>,
    pub course_type: Option<CourseType>,
    pub execution_type: Option<ExecutionType>,
    pub address: Option<String>,
    pub target_audience: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub link: Option<String>,
    pub category_names: Option<Vec<String>>,
}

/// A course payload that passed validation, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCourse {
    pub title: String,
    pub organizer: String,
    pub contact_person: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub course_form: Option<CourseForm>,
    pub course_type: CourseType,
    pub execution_type: Option<ExecutionType>,
    pub address: Option<String>,
    pub target_audience: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub link: Option<String>,
    pub category_names: Vec<String>,
}

impl NewCourse {
    pub fn into_course(self, id: i64) -> Course {
        Course {
            id,
            title: self.title,
            organizer: self.organizer,
            contact_person: self.contact_person,
            start_date: self.start_date,
            end_date: self.end_date,
            course_form: self.course_form,
            course_type: self.course_type,
            execution_type: self.execution_type,
            address: self.address,
            target_audience: self.target_audience,
            description: self.description,
            price: self.price,
            link: self.link,
            category_names: self.category_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_as_symbolic_names() {
        assert_eq!(
            serde_json::to_string(&CourseForm::LanguageCourse).unwrap(),
            "\"LANGUAGE_COURSE\""
        );
        assert_eq!(serde_json::to_string(&CourseType::External).unwrap(), "\"EXTERNAL\"");
        assert_eq!(serde_json::to_string(&ExecutionType::Onsite).unwrap(), "\"ONSITE\"");
    }

    #[test]
    fn unknown_course_form_names_type_value_and_accepted_values() {
        let err = serde_json::from_str::<CourseForm>("\"UNKNOWN_COURSE_FORM\"").unwrap_err();
        assert!(err.to_string().starts_with(
            "Cannot deserialize value of type `CourseForm` from String \"UNKNOWN_COURSE_FORM\": \
             not one of the values accepted for Enum class: \
             [SEMINAR, MEETUP, WORKSHOP, STUDY_GROUP, CERTIFICATION, CONFERENCE, LECTURE, LANGUAGE_COURSE]"
        ));
    }

    #[test]
    fn enum_literals_are_case_sensitive() {
        assert!("external".parse::<CourseType>().is_err());
        assert_eq!("INTERNAL".parse::<CourseType>(), Ok(CourseType::Internal));
    }

    #[test]
    fn course_json_has_camel_case_keys_and_no_deleted_flag() {
        let course = Course {
            id: 7,
            title: "Rust".to_string(),
            organizer: "Ferris".to_string(),
            contact_person: None,
            start_date: Some("2020-01-01T20:00:00Z".parse().unwrap()),
            end_date: None,
            course_form: Some(CourseForm::Workshop),
            course_type: CourseType::Internal,
            execution_type: None,
            address: None,
            target_audience: None,
            description: None,
            price: None,
            link: None,
            category_names: vec!["systems".to_string()],
        };

        let json = serde_json::to_value(&course).unwrap();
        assert_eq!(json["startDate"], "2020-01-01T20:00:00Z");
        assert_eq!(json["courseForm"], "WORKSHOP");
        assert_eq!(json["categoryNames"][0], "systems");
        assert!(json.get("deleted").is_none());
    }

    #[test]
    fn request_accepts_offsets_and_ignores_unknown_fields() {
        let req: CourseRequest = serde_json::from_str(
            r#"{"id": 99, "deleted": true, "title": "t", "startDate": "2020-01-01T22:00:00+02:00"}"#,
        )
        .unwrap();
        assert_eq!(req.title.as_deref(), Some("t"));
        assert_eq!(
            req.start_date.unwrap().to_rfc3339(),
            "2020-01-01T20:00:00+00:00"
        );
    }
}
