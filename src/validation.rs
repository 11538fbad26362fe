use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::TaskStatus;

pub const TITLE_MIN_LENGTH: usize = 3;
pub const TITLE_MAX_LENGTH: usize = 255;
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;

const LOCAL_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    fn new(field: &'static str, message: &'static str) -> Self {
        ValidationError { field, message }
    }
}

/// Which request the rules are applied to. Only creation rejects past due dates,
/// so that overdue tasks stay editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// Parses a submitted due date.
///
/// Accepts RFC 3339, a bare `YYYY-MM-DD` (UTC midnight) and the
/// `datetime-local` shapes `YYYY-MM-DD[T ]HH:MM[:SS]` (server local time).
pub fn parse_due_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    LOCAL_DATETIME_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(input, format).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Field-level validation of a create or update request.
///
/// All four rules always run; errors come out in field order
/// title, description, dueDate, status.
#[derive(Debug, Clone)]
pub struct TaskValidator {
    errors: Vec<ValidationError>,
    status: Option<TaskStatus>,
}

impl TaskValidator {
    pub fn for_create(title: &str, description: Option<&str>, due_date: &str, status: &str) -> Self {
        Self::for_create_at(Utc::now(), title, description, due_date, status)
    }

    pub fn for_create_at(
        now: DateTime<Utc>,
        title: &str,
        description: Option<&str>,
        due_date: &str,
        status: &str,
    ) -> Self {
        Self::validate(ValidationMode::Create, now, title, description, due_date, status)
    }

    pub fn for_update(title: &str, description: Option<&str>, due_date: &str, status: &str) -> Self {
        Self::for_update_at(Utc::now(), title, description, due_date, status)
    }

    pub fn for_update_at(
        now: DateTime<Utc>,
        title: &str,
        description: Option<&str>,
        due_date: &str,
        status: &str,
    ) -> Self {
        Self::validate(ValidationMode::Update, now, title, description, due_date, status)
    }

    pub fn validate(
        mode: ValidationMode,
        now: DateTime<Utc>,
        title: &str,
        description: Option<&str>,
        due_date: &str,
        status: &str,
    ) -> Self {
        let mut errors = Vec::new();
        errors.extend(check_title(title));
        errors.extend(check_description(description));
        errors.extend(check_due_date(mode, now, due_date));

        let status = status.parse::<TaskStatus>().ok();
        if status.is_none() {
            errors.push(ValidationError::new("status", "Invalid task status"));
        }

        TaskValidator { errors, status }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// All error messages, comma-joined, for a single alert.
    pub fn messages(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The parsed status, when it was one of the accepted values.
    pub fn status(&self) -> Option<TaskStatus> {
        self.status
    }
}

fn check_title(title: &str) -> Option<ValidationError> {
    let title = title.trim();
    let length = title.chars().count();

    if title.is_empty() {
        Some(ValidationError::new("title", "Title is required"))
    } else if length > TITLE_MAX_LENGTH {
        Some(ValidationError::new("title", "Title must be less than 255 characters"))
    } else if length < TITLE_MIN_LENGTH {
        Some(ValidationError::new("title", "Title must be at least 3 characters"))
    } else {
        None
    }
}

fn check_description(description: Option<&str>) -> Option<ValidationError> {
    match description {
        Some(text) if text.chars().count() > DESCRIPTION_MAX_LENGTH => Some(ValidationError::new(
            "description",
            "Description must be less than 1000 characters",
        )),
        _ => None,
    }
}

fn check_due_date(mode: ValidationMode, now: DateTime<Utc>, due_date: &str) -> Option<ValidationError> {
    if due_date.is_empty() {
        return Some(ValidationError::new("dueDate", "Due date is required"));
    }
    let Some(parsed) = parse_due_date(due_date) else {
        return Some(ValidationError::new("dueDate", "Invalid date format"));
    };
    if mode == ValidationMode::Create && parsed < now {
        return Some(ValidationError::new("dueDate", "Due date cannot be in the past"));
    }
    None
}
