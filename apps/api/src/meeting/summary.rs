//! Builds the "meeting saved" recap from whatever fields the session holds.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::meeting::models::MeetingSession;

/// Substituted for any field that was never rendered or edited.
pub const PLACEHOLDER: &str = "not provided";

pub const SAVED_MESSAGE: &str = "Meeting saved successfully!";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub label: &'static str,
    pub value: String,
    /// Multi-line values start on their own line when rendered.
    #[serde(skip)]
    pub block: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub lines: Vec<SummaryLine>,
}

fn or_placeholder(value: Option<String>) -> String {
    value.unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    or_placeholder(date.map(|d| d.format("%d/%m/%Y").to_string()))
}

fn fmt_time(time: Option<NaiveTime>) -> String {
    or_placeholder(time.map(|t| t.format("%H:%M").to_string()))
}

fn line(label: &'static str, value: String) -> SummaryLine {
    SummaryLine {
        label,
        value,
        block: false,
    }
}

fn block(label: &'static str, value: String) -> SummaryLine {
    SummaryLine {
        label,
        value,
        block: true,
    }
}

pub fn build_summary(session: &MeetingSession) -> Summary {
    let info = &session.info;
    let notes = &session.notes;
    let next = &session.next_meeting;

    let files = if session.documents.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        session.document_names().join(", ")
    };

    Summary {
        lines: vec![
            line("Title", or_placeholder(info.title.clone())),
            line("Date", fmt_date(info.date)),
            line("Time", fmt_time(info.time)),
            line("Participants", or_placeholder(info.participants.clone())),
            line("Uploaded files", files),
            block("Notes", or_placeholder(notes.raw.clone())),
            block("Formatted notes", or_placeholder(notes.formatted.clone())),
            line("Next meeting date", fmt_date(next.date)),
            line("Next meeting time", fmt_time(next.time)),
            line(
                "Next meeting duration",
                or_placeholder(next.duration.map(|d| format!("{:.1} hour(s)", d.hours()))),
            ),
            block(
                "Next meeting preparation",
                or_placeholder(next.preparation.clone()),
            ),
        ],
    }
}

impl Summary {
    /// Markdown recap, one field per paragraph.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("### Summary\n");
        for l in &self.lines {
            let sep = if l.block { "\n" } else { " " };
            out.push_str(&format!("\n**{}:**{}{}\n", l.label, sep, l.value));
        }
        out
    }

    #[cfg(test)]
    pub fn value(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.value.as_str())
    }
}
