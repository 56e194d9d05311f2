#![allow(dead_code)]

use async_trait::async_trait;
use calendar_menu::components::google_calendar::models::{EventDateTime, EventStatus};
use calendar_menu::components::google_calendar::{
    CalendarEvent, CalendarHandle, CalendarService, ListEventsRequest,
};
use calendar_menu::error::{google_calendar_error, CalendarResult};
use std::sync::{Arc, Mutex};

/// In-memory calendar service that records every listing request
#[derive(Default)]
pub struct MockCalendarService {
    events: Mutex<Vec<CalendarEvent>>,
    requests: Mutex<Vec<ListEventsRequest>>,
    updates: Mutex<usize>,
    fail: bool,
}

impl MockCalendarService {
    /// Mock with two predefined events
    pub fn new() -> Self {
        Self::with_events(vec![
            event("event1", "Test Event 1", "2023-01-01T10:00:00Z"),
            event("event2", "Test Event 2", "2023-01-02T10:00:00Z"),
        ])
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    /// Mock whose every call fails like an unreachable API
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<ListEventsRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        *self.updates.lock().unwrap()
    }

    pub fn stored(&self, id: &str) -> Option<CalendarEvent> {
        self.events.lock().unwrap().iter().find(|e| e.id == id).cloned()
    }

    fn check(&self) -> CalendarResult<()> {
        if self.fail {
            return Err(google_calendar_error("Failed to fetch events: HTTP 503"));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarService for MockCalendarService {
    async fn list_events(&self, request: &ListEventsRequest) -> CalendarResult<Vec<CalendarEvent>> {
        self.requests.lock().unwrap().push(request.clone());
        self.check()?;

        let keyword = request.query.to_lowercase();
        let mut events: Vec<CalendarEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            // Cancelled events are hidden from listings like showDeleted=false
            .filter(|e| e.status != Some(EventStatus::Cancelled))
            .filter(|e| {
                keyword.is_empty()
                    || e.summary
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&keyword))
            })
            .cloned()
            .collect();

        events.sort_by(|a, b| a.start_label().cmp(&b.start_label()));
        events.truncate(request.max_results as usize);
        Ok(events)
    }

    async fn get_event(&self, _calendar_id: &str, event_id: &str) -> CalendarResult<CalendarEvent> {
        self.check()?;
        self.stored(event_id)
            .ok_or_else(|| google_calendar_error("Failed to fetch event: HTTP 404 Not Found"))
    }

    async fn insert_event(
        &self,
        _calendar_id: &str,
        event: &CalendarEvent,
    ) -> CalendarResult<CalendarEvent> {
        self.check()?;
        let mut events = self.events.lock().unwrap();
        let mut inserted = event.clone();
        inserted.id = format!("event{}", events.len() + 1);
        inserted.status.get_or_insert(EventStatus::Confirmed);
        events.push(inserted.clone());
        Ok(inserted)
    }

    async fn update_event(
        &self,
        _calendar_id: &str,
        event_id: &str,
        event: &CalendarEvent,
    ) -> CalendarResult<CalendarEvent> {
        self.check()?;
        let mut events = self.events.lock().unwrap();
        let slot = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| google_calendar_error("Failed to update event: HTTP 404 Not Found"))?;
        *slot = event.clone();
        *self.updates.lock().unwrap() += 1;
        Ok(slot.clone())
    }

    async fn delete_event(&self, _calendar_id: &str, event_id: &str) -> CalendarResult<()> {
        self.check()?;
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != event_id);
        if events.len() == before {
            return Err(google_calendar_error("Failed to delete event: HTTP 410 Gone"));
        }
        Ok(())
    }
}

pub fn event(id: &str, summary: &str, start: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: Some(summary.to_string()),
        status: Some(EventStatus::Confirmed),
        start: Some(EventDateTime {
            date_time: Some(start.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Handle over `service` for the primary calendar with the default page size
pub fn handle(service: &Arc<MockCalendarService>) -> CalendarHandle {
    CalendarHandle::new(service.clone(), "primary", 10)
}
