//! Terminal rendering of events.

use crate::components::google_calendar::models::{CalendarEvent, EventDateTime, Person};
use chrono::DateTime;
use chrono_tz::Tz;
use std::fmt::Write;

pub const NO_EVENTS: &str = "No upcoming events found.";
const NO_TITLE: &str = "(no title)";

/// Numbered listing, one `"{n} {start} {summary}"` line per event
pub fn format_event_list(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return format!("{}\n", NO_EVENTS);
    }

    let mut out = String::new();
    for (index, event) in events.iter().enumerate() {
        let _ = writeln!(
            out,
            "{} {} {}",
            index + 1,
            event.start_label().unwrap_or("-"),
            event.summary.as_deref().unwrap_or(NO_TITLE)
        );
    }
    out
}

/// Full dump of one event; timed starts/ends are also shown in `tz`
pub fn format_event_details(event: &CalendarEvent, tz: Tz) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Summary:     {}", event.summary.as_deref().unwrap_or(NO_TITLE));
    let _ = writeln!(out, "Id:          {}", event.id);
    if let Some(status) = event.status {
        let _ = writeln!(out, "Status:      {}", status.as_str());
    }
    if let Some(start) = &event.start {
        let _ = writeln!(out, "Start:       {}", format_when(start, tz));
    }
    if let Some(end) = &event.end {
        let _ = writeln!(out, "End:         {}", format_when(end, tz));
    }
    if let Some(location) = &event.location {
        let _ = writeln!(out, "Location:    {}", location);
    }
    if let Some(description) = &event.description {
        let _ = writeln!(out, "Description: {}", description);
    }
    if let Some(creator) = event.creator.as_ref().and_then(format_person) {
        let _ = writeln!(out, "Creator:     {}", creator);
    }
    if let Some(organizer) = event.organizer.as_ref().and_then(format_person) {
        let _ = writeln!(out, "Organizer:   {}", organizer);
    }
    if !event.attendees.is_empty() {
        let _ = writeln!(out, "Attendees:");
        for attendee in &event.attendees {
            let _ = writeln!(
                out,
                "  - {} ({})",
                attendee.email.as_deref().unwrap_or("unknown"),
                attendee.response_status.as_deref().unwrap_or("needsAction")
            );
        }
    }
    if let Some(reminders) = &event.reminders {
        if reminders.use_default {
            let _ = writeln!(out, "Reminders:   default");
        }
        for reminder in &reminders.overrides {
            let _ = writeln!(
                out,
                "Reminder:    {} {} minutes before",
                reminder.method, reminder.minutes
            );
        }
    }
    if let Some(link) = &event.html_link {
        let _ = writeln!(out, "Link:        {}", link);
    }

    out
}

fn format_when(when: &EventDateTime, tz: Tz) -> String {
    match (&when.date_time, &when.date) {
        (Some(date_time), _) => match DateTime::parse_from_rfc3339(date_time) {
            Ok(parsed) => format!(
                "{} ({})",
                date_time,
                parsed.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z")
            ),
            Err(_) => date_time.clone(),
        },
        (None, Some(date)) => format!("{} (all day)", date),
        (None, None) => "-".to_string(),
    }
}

fn format_person(person: &Person) -> Option<String> {
    match (&person.display_name, &person.email) {
        (Some(name), Some(email)) => Some(format!("{} <{}>", name, email)),
        (None, Some(email)) => Some(email.clone()),
        (Some(name), None) => Some(name.clone()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::google_calendar::models::{EventStatus, ReminderOverride, Reminders};

    fn timed(id: &str, summary: &str, start: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            summary: Some(summary.to_string()),
            start: Some(EventDateTime {
                date_time: Some(start.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_event_list(&[]), "No upcoming events found.\n");
    }

    #[test]
    fn test_numbered_list() {
        let all_day = CalendarEvent {
            id: "b".to_string(),
            start: Some(EventDateTime {
                date: Some("2023-06-03".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let listing = format_event_list(&[timed("a", "Standup", "2023-01-01T10:00:00Z"), all_day]);

        assert_eq!(listing, "1 2023-01-01T10:00:00Z Standup\n2 2023-06-03 (no title)\n");
    }

    #[test]
    fn test_details_in_display_timezone() {
        let mut event = timed("a", "Standup", "2023-01-01T10:00:00Z");
        event.status = Some(EventStatus::Cancelled);
        event.organizer = Some(Person {
            email: Some("boss@example.com".to_string()),
            display_name: Some("Boss".to_string()),
            ..Default::default()
        });
        event.reminders = Some(Reminders {
            use_default: false,
            overrides: vec![ReminderOverride { method: "popup".to_string(), minutes: 10 }],
        });

        let details = format_event_details(&event, chrono_tz::Europe::Helsinki);

        assert!(details.contains("Status:      cancelled"));
        assert!(details.contains("2023-01-01T10:00:00Z (2023-01-01 12:00 EET)"));
        assert!(details.contains("Organizer:   Boss <boss@example.com>"));
        assert!(details.contains("Reminder:    popup 10 minutes before"));
        assert!(!details.contains("Location"));
    }
}
