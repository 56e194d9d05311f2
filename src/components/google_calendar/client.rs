use super::models::{CalendarEvent, EventsPage};
use super::token::TokenManager;
use super::CalendarService;
use crate::error::{google_calendar_error, CalendarResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;
use url::Url;

/// Base URL of the Calendar v3 REST API
pub const API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Parameters of an events.list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEventsRequest {
    pub calendar_id: String,
    pub time_min: String,
    pub time_max: String,
    pub max_results: i32,
    /// Free-text filter, empty means no filter
    pub query: String,
    pub single_events: bool,
    pub order_by: String,
}

/// Calendar service backed by the Google Calendar REST API
#[derive(Clone)]
pub struct GoogleCalendarClient {
    base_url: String,
    token_manager: TokenManager,
    client: Client,
}

impl GoogleCalendarClient {
    pub fn new(token_manager: TokenManager) -> Self {
        Self::with_base_url(token_manager, API_BASE_URL)
    }

    /// Point the client at a different API root
    pub fn with_base_url(token_manager: TokenManager, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token_manager,
            client: Client::new(),
        }
    }

    /// `{base}/calendars/{calendar_id}/events[/{event_id}]` with escaped segments
    fn events_url(&self, calendar_id: &str, event_id: Option<&str>) -> CalendarResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| google_calendar_error("API base URL cannot have a path"))?;
            segments.pop_if_empty().extend(["calendars", calendar_id, "events"]);
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> CalendarResult<Response> {
        let access_token = self.token_manager.access_token().await?;
        let response = request
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to {}: HTTP {} - {}",
                action, status, error_body
            )));
        }

        Ok(response)
    }

    async fn parse_event(response: Response, action: &str) -> CalendarResult<CalendarEvent> {
        response.json::<CalendarEvent>().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse {} response: {}", action, e))
        })
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn list_events(&self, request: &ListEventsRequest) -> CalendarResult<Vec<CalendarEvent>> {
        let mut url = self.events_url(&request.calendar_id, None)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("timeMin", &request.time_min)
                .append_pair("timeMax", &request.time_max)
                .append_pair("maxResults", &request.max_results.to_string())
                .append_pair("singleEvents", &request.single_events.to_string())
                .append_pair("orderBy", &request.order_by);
            if !request.query.is_empty() {
                query.append_pair("q", &request.query);
            }
        }

        debug!("Listing events: {}", url);
        let response = self.send(self.client.get(url), "fetch events").await?;

        let page: EventsPage = response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse events response: {}", e))
        })?;

        Ok(page.items)
    }

    async fn get_event(&self, calendar_id: &str, event_id: &str) -> CalendarResult<CalendarEvent> {
        let url = self.events_url(calendar_id, Some(event_id))?;
        debug!("Fetching event {}", event_id);
        let response = self.send(self.client.get(url), "fetch event").await?;
        Self::parse_event(response, "event").await
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> CalendarResult<CalendarEvent> {
        let url = self.events_url(calendar_id, None)?;
        debug!("Inserting event");
        let response = self
            .send(self.client.post(url).json(event), "insert event")
            .await?;
        Self::parse_event(response, "insert").await
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &CalendarEvent,
    ) -> CalendarResult<CalendarEvent> {
        let url = self.events_url(calendar_id, Some(event_id))?;
        debug!("Updating event {}", event_id);
        let response = self
            .send(self.client.put(url).json(event), "update event")
            .await?;
        Self::parse_event(response, "update").await
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> CalendarResult<()> {
        let url = self.events_url(calendar_id, Some(event_id))?;
        debug!("Deleting event {}", event_id);
        self.send(self.client.delete(url), "delete event").await?;
        Ok(())
    }
}
