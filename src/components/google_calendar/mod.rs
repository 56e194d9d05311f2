pub mod auth;
mod client;
mod handle;
pub mod models;
pub mod time;
pub mod token;

pub use client::{GoogleCalendarClient, ListEventsRequest, API_BASE_URL};
pub use handle::{CalendarHandle, DayListing};
pub use models::CalendarEvent;

use crate::error::CalendarResult;
use async_trait::async_trait;

/// Event operations offered by a calendar backend
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// events.list with the given window, cap, filter and ordering
    async fn list_events(&self, request: &ListEventsRequest) -> CalendarResult<Vec<CalendarEvent>>;

    async fn get_event(&self, calendar_id: &str, event_id: &str) -> CalendarResult<CalendarEvent>;

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> CalendarResult<CalendarEvent>;

    /// Replace the stored event with `event`
    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &CalendarEvent,
    ) -> CalendarResult<CalendarEvent>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> CalendarResult<()>;
}
