//! Task record and due-date input helpers.
//!
//! # Responsibility
//! - Define the task shape persisted in `tasks`.
//! - Convert the form's `dd/MM/yyyy HH:mm` text to and from epoch millis.
//!
//! # Invariants
//! - `due_date` is always a concrete instant; unparseable input is rejected
//!   instead of being replaced by the current time.

use super::attachment::Attachments;
use super::{Entity, RecordId, ValidationError};
use chrono::{NaiveDate, NaiveTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Display pattern for due dates.
pub const DUE_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

// Time pickers emit unpadded fields such as `3/7/2025 9:5`.
static DUE_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})\s+([0-9]{1,2}):([0-9]{1,2})\s*$")
        .expect("valid due date regex")
});

/// Actionable item with a due instant and optional reminder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Storage-assigned id, `0` until inserted.
    pub id: RecordId,
    pub title: String,
    pub description: String,
    /// Unix epoch milliseconds.
    pub due_date: i64,
    /// Unix epoch milliseconds; the due date is used when absent.
    pub reminder_date: Option<i64>,
    pub is_completed: bool,
    pub attachments: Attachments,
}

impl Task {
    /// Creates an unsaved, open task.
    pub fn new(title: impl Into<String>, description: impl Into<String>, due_date: i64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            due_date,
            reminder_date: None,
            is_completed: false,
            attachments: Attachments::default(),
        }
    }

    /// Builds an unsaved task from raw form input interpreted in `tz`.
    pub fn from_form<Tz: TimeZone>(
        title: impl Into<String>,
        description: impl Into<String>,
        due_input: &str,
        tz: &Tz,
    ) -> Result<Self, ValidationError> {
        let due_date = parse_due_date(due_input, tz)?;
        Ok(Self::new(title, description, due_date))
    }

    pub fn with_reminder(mut self, reminder_date: i64) -> Self {
        self.reminder_date = Some(reminder_date);
        self
    }

    pub fn with_attachments(mut self, attachments: Attachments) -> Self {
        self.attachments = attachments;
        self
    }

    /// Instant a reminder should fire for this task.
    pub fn reminder_instant(&self) -> i64 {
        self.reminder_date.unwrap_or(self.due_date)
    }
}

impl Entity for Task {
    const KIND: &'static str = "task";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn attachments(&self) -> &Attachments {
        &self.attachments
    }
}

/// Parses `d/M/yyyy H:m` (fields may be one or two digits) in `tz`.
///
/// # Errors
/// - Input that does not match the pattern.
/// - Out-of-range calendar or clock fields.
/// - Local times skipped by a daylight-saving transition.
pub fn parse_due_date<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<i64, ValidationError> {
    let caps = DUE_DATE_RE
        .captures(input)
        .ok_or(ValidationError::InvalidDueDate {
            reason: "expected dd/MM/yyyy HH:mm",
        })?;

    let field = |index: usize| -> Result<u32, ValidationError> {
        caps[index]
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidDueDate {
                reason: "non-numeric field",
            })
    };
    let day = field(1)?;
    let month = field(2)?;
    let year = i32::try_from(field(3)?).map_err(|_| ValidationError::InvalidDueDate {
        reason: "year out of range",
    })?;
    let hour = field(4)?;
    let minute = field(5)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ValidationError::InvalidDueDate {
        reason: "no such calendar date",
    })?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ValidationError::InvalidDueDate {
        reason: "no such time of day",
    })?;

    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|instant| instant.timestamp_millis())
        .ok_or(ValidationError::InvalidDueDate {
            reason: "local time does not exist in time zone",
        })
}

/// Formats epoch millis as `dd/MM/yyyy HH:mm` in `tz`.
pub fn format_due_date<Tz>(epoch_ms: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(epoch_ms)
        .single()
        .map(|instant| instant.format(DUE_DATE_FORMAT).to_string())
}
