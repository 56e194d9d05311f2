//! Interactive numbered menu over a calendar.

use crate::components::google_calendar::{CalendarEvent, CalendarHandle};
use crate::display::{format_event_details, format_event_list};
use crate::error::{other_error, CalendarResult};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use inquire::InquireError;
use std::io::{BufRead, Write};
use tracing::debug;

pub const INVALID_INPUT: &str = "Invalid input";

/// Source of user input lines
pub trait Prompt {
    /// Show `message` and read one line; `None` once input is closed
    fn read_line(&mut self, message: &str) -> CalendarResult<Option<String>>;
}

/// Interactive prompt for a terminal
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn read_line(&mut self, message: &str) -> CalendarResult<Option<String>> {
        match inquire::Text::new(message).prompt() {
            Ok(line) => Ok(Some(line)),
            // Esc abandons the current answer only
            Err(InquireError::OperationCanceled) => Ok(Some(String::new())),
            Err(InquireError::OperationInterrupted) => Ok(None),
            Err(e) => Err(other_error(&format!("Failed to read input: {}", e))),
        }
    }
}

/// Line-based prompt over any reader, used when input is piped
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn read_line(&mut self, message: &str) -> CalendarResult<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        // Bytes that are not UTF-8 become replacement characters and fail parsing
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Entries of the main menu, numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ShowAll,
    Search,
    ByDate,
    Details,
    Delete,
    Edit,
    Cancel,
    Quit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 8] = [
        MenuChoice::ShowAll,
        MenuChoice::Search,
        MenuChoice::ByDate,
        MenuChoice::Details,
        MenuChoice::Delete,
        MenuChoice::Edit,
        MenuChoice::Cancel,
        MenuChoice::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::ShowAll => "Show all events",
            MenuChoice::Search => "Search for events",
            MenuChoice::ByDate => "Show events on a date",
            MenuChoice::Details => "Show event details",
            MenuChoice::Delete => "Delete event",
            MenuChoice::Edit => "Edit event",
            MenuChoice::Cancel => "Cancel event",
            MenuChoice::Quit => "Quit",
        }
    }

    /// Parse a 1-based menu number
    pub fn parse(input: &str) -> Option<Self> {
        let number = input.trim().parse::<usize>().ok()?;
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index))
            .copied()
    }
}

/// Resolve a 1-based selection against the current list
pub fn select_index(input: &str, len: usize) -> Option<usize> {
    let number = input.trim().parse::<i64>().ok()?;
    if number < 1 || number as u64 > len as u64 {
        return None;
    }
    Some(number as usize - 1)
}

enum Flow {
    Continue,
    Quit,
}

/// Menu loop holding the last fetched page of events
pub struct Menu<P, W> {
    calendar: CalendarHandle,
    prompt: P,
    out: W,
    timezone: Tz,
    started_at: DateTime<Utc>,
    events: Vec<CalendarEvent>,
}

impl<P: Prompt, W: Write> Menu<P, W> {
    pub fn new(calendar: CalendarHandle, prompt: P, out: W, timezone: Tz) -> Self {
        Self::starting_at(calendar, prompt, out, timezone, Utc::now())
    }

    /// Menu whose query window is anchored at `started_at`
    pub fn starting_at(
        calendar: CalendarHandle,
        prompt: P,
        out: W,
        timezone: Tz,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            calendar,
            prompt,
            out,
            timezone,
            started_at,
            events: Vec::new(),
        }
    }

    /// Events the current selection numbers refer to
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until the user quits or input ends. Service errors end the loop.
    pub async fn run(&mut self) -> CalendarResult<()> {
        loop {
            self.print_menu()?;

            let Some(input) = self.prompt.read_line("Input option: ")? else {
                break;
            };

            let Some(choice) = MenuChoice::parse(&input) else {
                self.invalid()?;
                continue;
            };

            debug!("Menu choice {:?}", choice);
            if let Flow::Quit = self.dispatch(choice).await? {
                break;
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, choice: MenuChoice) -> CalendarResult<Flow> {
        match choice {
            MenuChoice::ShowAll => {
                self.events = self.calendar.all_events(self.started_at).await?;
                self.print_events()?;
                Ok(Flow::Continue)
            }
            MenuChoice::Search => self.search().await,
            MenuChoice::ByDate => self.by_date().await,
            MenuChoice::Details => self.details().await,
            MenuChoice::Delete => self.delete().await,
            MenuChoice::Edit => self.edit().await,
            MenuChoice::Cancel => self.cancel().await,
            MenuChoice::Quit => Ok(Flow::Quit),
        }
    }

    async fn search(&mut self) -> CalendarResult<Flow> {
        let Some(keyword) = self.prompt.read_line("Key words for event: ")? else {
            return Ok(Flow::Quit);
        };
        self.events = self
            .calendar
            .search_events(self.started_at, keyword.trim())
            .await?;
        self.print_events()?;
        Ok(Flow::Continue)
    }

    async fn by_date(&mut self) -> CalendarResult<Flow> {
        let mut parts = [0i32; 3];
        for (slot, label) in parts.iter_mut().zip(["Year: ", "Month: ", "Day: "]) {
            let Some(input) = self.prompt.read_line(label)? else {
                return Ok(Flow::Quit);
            };
            match input.trim().parse::<i32>() {
                Ok(value) => *slot = value,
                Err(_) => {
                    self.invalid()?;
                    return Ok(Flow::Continue);
                }
            }
        }

        let [year, month, day] = parts;
        let listing = self.calendar.events_on_date(year, month, day).await?;
        for warning in &listing.warnings {
            writeln!(self.out, "{}", warning)?;
        }
        self.events = listing.events;
        self.print_events()?;
        Ok(Flow::Continue)
    }

    async fn details(&mut self) -> CalendarResult<Flow> {
        let Some(event_id) = self.select("Select event to view: ")? else {
            return Ok(Flow::Continue);
        };
        let event = self.calendar.get_event(&event_id).await?;
        write!(self.out, "{}", format_event_details(&event, self.timezone))?;
        Ok(Flow::Continue)
    }

    async fn delete(&mut self) -> CalendarResult<Flow> {
        let Some(event_id) = self.select("Select event to delete: ")? else {
            return Ok(Flow::Continue);
        };
        self.calendar.delete_event(&event_id).await?;

        // Numbers shift after a removal
        self.events = self.calendar.all_events(self.started_at).await?;
        self.print_events()?;
        Ok(Flow::Continue)
    }

    async fn edit(&mut self) -> CalendarResult<Flow> {
        let Some(event_id) = self.select("Select event to edit: ")? else {
            return Ok(Flow::Continue);
        };
        let Some(summary) = self.prompt.read_line("Enter your summary message: ")? else {
            return Ok(Flow::Quit);
        };
        if summary.trim().is_empty() {
            self.invalid()?;
            return Ok(Flow::Continue);
        }
        let Some(answer) = self.prompt.read_line("Add a popup reminder? (y/n): ")? else {
            return Ok(Flow::Quit);
        };

        let reminder = if is_yes(&answer) {
            let Some(input) = self.prompt.read_line("Minutes before the event: ")? else {
                return Ok(Flow::Quit);
            };
            match input.trim().parse::<i64>() {
                Ok(minutes) if minutes >= 0 => Some(minutes),
                _ => {
                    self.invalid()?;
                    return Ok(Flow::Continue);
                }
            }
        } else {
            None
        };

        self.calendar
            .edit_event(&event_id, summary.trim(), reminder)
            .await?;
        writeln!(self.out, "Event has been updated")?;
        Ok(Flow::Continue)
    }

    async fn cancel(&mut self) -> CalendarResult<Flow> {
        let Some(event_id) = self.select("Select event to cancel: ")? else {
            return Ok(Flow::Continue);
        };
        self.calendar.cancel_event(&event_id).await?;
        writeln!(self.out, "Event has been cancelled")?;
        Ok(Flow::Continue)
    }

    /// Ask for an event number; `None` after reporting invalid input or when input ends
    fn select(&mut self, message: &str) -> CalendarResult<Option<String>> {
        let Some(input) = self.prompt.read_line(message)? else {
            return Ok(None);
        };
        match select_index(&input, self.events.len()) {
            Some(index) => Ok(Some(self.events[index].id.clone())),
            None => {
                self.invalid()?;
                Ok(None)
            }
        }
    }

    fn print_menu(&mut self) -> CalendarResult<()> {
        writeln!(self.out, "\nMenu:")?;
        for (index, choice) in MenuChoice::ALL.iter().enumerate() {
            writeln!(self.out, "{}. {}", index + 1, choice.label())?;
        }
        Ok(())
    }

    fn print_events(&mut self) -> CalendarResult<()> {
        write!(self.out, "{}", format_event_list(&self.events))?;
        Ok(())
    }

    fn invalid(&mut self) -> CalendarResult<()> {
        writeln!(self.out, "{}", INVALID_INPUT)?;
        Ok(())
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
