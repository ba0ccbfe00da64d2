//! Form state for one meeting-notes session.
//!
//! Every field starts as `None` and only gains a value once its section has
//! been rendered (widget default) or edited. The summary relies on this to
//! tell untouched fields apart from populated ones.

use bytes::Bytes;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::meeting::tabs::Tab;

/// Widget step for time pickers, in minutes.
pub const TIME_STEP_MINUTES: u32 = 30;
pub const MIN_DURATION_HOURS: f64 = 0.5;
pub const MAX_DURATION_HOURS: f64 = 8.0;
pub const DURATION_STEP_HOURS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("{field} must be on a 30-minute step, got {value}")]
    TimeOffStep { field: &'static str, value: NaiveTime },

    #[error("duration must be between 0.5 and 8.0 hours, got {0}")]
    DurationOutOfRange(f64),

    #[error("duration must be a multiple of 0.5 hours, got {0}")]
    DurationOffStep(f64),
}

/// Default time shown by every time picker (10:00).
pub fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default()
}

fn check_time(field: &'static str, value: NaiveTime) -> Result<NaiveTime, FieldError> {
    if value.minute() % TIME_STEP_MINUTES != 0 || value.second() != 0 || value.nanosecond() != 0 {
        return Err(FieldError::TimeOffStep { field, value });
    }
    Ok(value)
}

/// Length of the next meeting, stored in half hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingDuration {
    half_hours: u8,
}

impl MeetingDuration {
    pub fn from_hours(hours: f64) -> Result<Self, FieldError> {
        if !hours.is_finite() || !(MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(&hours) {
            return Err(FieldError::DurationOutOfRange(hours));
        }
        let steps = hours / DURATION_STEP_HOURS;
        if (steps - steps.round()).abs() > f64::EPSILON {
            return Err(FieldError::DurationOffStep(hours));
        }
        Ok(Self {
            half_hours: steps.round() as u8,
        })
    }

    pub fn hours(&self) -> f64 {
        f64::from(self.half_hours) * DURATION_STEP_HOURS
    }
}

impl Default for MeetingDuration {
    fn default() -> Self {
        Self { half_hours: 2 }
    }
}

impl Serialize for MeetingDuration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.hours())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MeetingInfo {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub participants: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MeetingNotes {
    pub raw: Option<String>,
    /// Last successful formatting result; replaced on every success.
    pub formatted: Option<String>,
}

impl MeetingNotes {
    /// The notes to send for formatting, or `None` when there is nothing but whitespace.
    pub fn for_formatting(&self) -> Option<&str> {
        self.raw.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// An uploaded file. Only the name is ever shown; the content is kept as-is.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedDocument {
    pub name: String,
    #[serde(skip)]
    pub content: Bytes,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NextMeetingPlan {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration: Option<MeetingDuration>,
    pub preparation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingInfoUpdate {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub participants: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextMeetingUpdate {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    /// Hours, 0.5 to 8.0 in half-hour steps.
    pub duration: Option<f64>,
    pub preparation: Option<String>,
}

/// All form state owned by one session.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingSession {
    /// Day the session was opened; date pickers default to it.
    pub opened_on: NaiveDate,
    pub active_tab: Tab,
    pub info: MeetingInfo,
    pub notes: MeetingNotes,
    pub documents: Vec<UploadedDocument>,
    pub next_meeting: NextMeetingPlan,
}

impl MeetingSession {
    /// Opens a session with the first tab selected and rendered.
    pub fn new(opened_on: NaiveDate) -> Self {
        let mut session = Self {
            opened_on,
            active_tab: Tab::Info,
            info: MeetingInfo::default(),
            notes: MeetingNotes::default(),
            documents: Vec::new(),
            next_meeting: NextMeetingPlan::default(),
        };
        session.render(Tab::Info);
        session
    }

    /// Selects a tab. Any tab can follow any other.
    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        self.render(tab);
    }

    /// Fills in widget defaults for a section that has never been shown.
    /// Values already present are left alone.
    pub fn render(&mut self, tab: Tab) {
        let today = self.opened_on;
        match tab {
            Tab::Info => {
                let info = &mut self.info;
                info.title.get_or_insert_with(String::new);
                info.date.get_or_insert(today);
                info.time.get_or_insert_with(default_time);
                info.participants.get_or_insert_with(String::new);
            }
            Tab::Notes => {
                self.notes.raw.get_or_insert_with(String::new);
            }
            Tab::Documents => {}
            Tab::NextMeeting => {
                let next = &mut self.next_meeting;
                next.date.get_or_insert(today);
                next.time.get_or_insert_with(default_time);
                next.duration.get_or_insert_with(MeetingDuration::default);
                next.preparation.get_or_insert_with(String::new);
            }
        }
    }

    /// Applies the provided fields; nothing is changed if any field is rejected.
    pub fn update_info(&mut self, update: MeetingInfoUpdate) -> Result<(), FieldError> {
        let time = update
            .time
            .map(|t| check_time("meeting time", t))
            .transpose()?;

        let info = &mut self.info;
        if let Some(title) = update.title {
            info.title = Some(title);
        }
        if let Some(date) = update.date {
            info.date = Some(date);
        }
        if time.is_some() {
            info.time = time;
        }
        if let Some(participants) = update.participants {
            info.participants = Some(participants);
        }
        Ok(())
    }

    pub fn set_notes(&mut self, raw: String) {
        self.notes.raw = Some(raw);
    }

    pub fn set_formatted_notes(&mut self, formatted: String) {
        self.notes.formatted = Some(formatted);
    }

    pub fn add_document(&mut self, name: String, content: Bytes) {
        self.documents.push(UploadedDocument { name, content });
    }

    pub fn clear_documents(&mut self) {
        self.documents.clear();
    }

    pub fn document_names(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.name.as_str()).collect()
    }

    /// Combined size of the held upload contents.
    pub fn document_bytes(&self) -> usize {
        self.documents.iter().map(|d| d.content.len()).sum()
    }

    /// Applies the provided fields; nothing is changed if any field is rejected.
    pub fn update_next_meeting(&mut self, update: NextMeetingUpdate) -> Result<(), FieldError> {
        let time = update
            .time
            .map(|t| check_time("next meeting time", t))
            .transpose()?;
        let duration = update.duration.map(MeetingDuration::from_hours).transpose()?;

        let next = &mut self.next_meeting;
        if let Some(date) = update.date {
            next.date = Some(date);
        }
        if time.is_some() {
            next.time = time;
        }
        if duration.is_some() {
            next.duration = duration;
        }
        if let Some(preparation) = update.preparation {
            next.preparation = Some(preparation);
        }
        Ok(())
    }
}
