use super::client::ListEventsRequest;
use super::models::{CalendarEvent, EventStatus, POPUP_REMINDER};
use super::time::{day_bounds, query_window, validate_date, DateWarning, QueryWindow};
use super::CalendarService;
use crate::error::{invalid_input, CalendarResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Events found for a single day, with any warnings about the requested date
#[derive(Debug, Clone, Default)]
pub struct DayListing {
    pub warnings: Vec<DateWarning>,
    pub events: Vec<CalendarEvent>,
}

/// Queries and mutations against one calendar
#[derive(Clone)]
pub struct CalendarHandle {
    service: Arc<dyn CalendarService>,
    calendar_id: String,
    page_size: i32,
}

impl CalendarHandle {
    pub fn new(service: Arc<dyn CalendarService>, calendar_id: &str, page_size: i32) -> Self {
        Self {
            service,
            calendar_id: calendar_id.to_string(),
            page_size,
        }
    }

    /// Up to `limit` single events within the window, ordered by start time
    pub async fn list_events(
        &self,
        window: &QueryWindow,
        limit: i32,
        keyword: &str,
    ) -> CalendarResult<Vec<CalendarEvent>> {
        if limit < 1 {
            return Err(invalid_input("Number of events must be at least 1."));
        }

        let request = ListEventsRequest {
            calendar_id: self.calendar_id.clone(),
            time_min: window.time_min.clone(),
            time_max: window.time_max.clone(),
            max_results: limit,
            query: keyword.to_string(),
            single_events: true,
            order_by: "startTime".to_string(),
        };

        self.service.list_events(&request).await
    }

    /// One page of events from the default window around `now`
    pub async fn all_events(&self, now: DateTime<Utc>) -> CalendarResult<Vec<CalendarEvent>> {
        self.list_events(&query_window(now)?, self.page_size, "").await
    }

    /// Like `all_events`, filtered by keyword
    pub async fn search_events(
        &self,
        now: DateTime<Utc>,
        keyword: &str,
    ) -> CalendarResult<Vec<CalendarEvent>> {
        self.list_events(&query_window(now)?, self.page_size, keyword)
            .await
    }

    /// Events of one calendar day. Out-of-range components only produce
    /// warnings; the query is sent as given.
    pub async fn events_on_date(&self, year: i32, month: i32, day: i32) -> CalendarResult<DayListing> {
        let warnings = validate_date(year, month, day);
        for warning in &warnings {
            debug!("{}", warning);
        }

        let events = self
            .list_events(&day_bounds(year, month, day), self.page_size, "")
            .await?;

        Ok(DayListing { warnings, events })
    }

    pub async fn get_event(&self, event_id: &str) -> CalendarResult<CalendarEvent> {
        self.service.get_event(&self.calendar_id, event_id).await
    }

    /// Replace the summary and optionally add a popup reminder
    pub async fn edit_event(
        &self,
        event_id: &str,
        summary: &str,
        reminder_minutes: Option<i64>,
    ) -> CalendarResult<CalendarEvent> {
        let mut event = self.get_event(event_id).await?;

        event.summary = Some(summary.to_string());
        if let Some(minutes) = reminder_minutes {
            event.add_reminder_override(POPUP_REMINDER, minutes);
        }

        info!("Updating event {}", event_id);
        self.service
            .update_event(&self.calendar_id, event_id, &event)
            .await
    }

    /// Mark the event cancelled. The returned copy is not checked.
    pub async fn cancel_event(&self, event_id: &str) -> CalendarResult<()> {
        let mut event = self.get_event(event_id).await?;
        event.status = Some(EventStatus::Cancelled);

        info!("Cancelling event {}", event_id);
        self.service
            .update_event(&self.calendar_id, event_id, &event)
            .await?;
        Ok(())
    }

    pub async fn delete_event(&self, event_id: &str) -> CalendarResult<()> {
        info!("Deleting event {}", event_id);
        self.service.delete_event(&self.calendar_id, event_id).await
    }
}
