//! EMS Platform TUI Application
//!
//! A terminal user interface for browsing EMS Platform lookup resources.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use serde_json::Value;
use std::io::{self, Stdout};
use std::time::Duration;

use ems_platform_client::{
    ClientConfig, DepartmentsParams, EmsClient, EventTypesParams, PageParams, RoomsParams,
    SearchParams,
};

const PAGE_SIZE: u32 = 15;

// ============================================================================
// Application State
// ============================================================================

/// Represents the current screen being displayed
#[derive(Debug, Clone, PartialEq)]
enum AppScreen {
    /// URL and credential input
    Login,
    /// Authenticating against the API
    Authenticating,
    /// Resource selection screen
    ResourceSelection,
    /// Loading records from API
    LoadingRecords,
    /// Record table screen with pagination
    RecordTable,
}

/// Which login field has focus
#[derive(Debug, Clone, Copy, PartialEq)]
enum LoginField {
    Url,
    ClientId,
    Secret,
}

impl LoginField {
    fn next(self) -> Self {
        match self {
            LoginField::Url => LoginField::ClientId,
            LoginField::ClientId => LoginField::Secret,
            LoginField::Secret => LoginField::Url,
        }
    }
}

/// Lookup resources that can be browsed
#[derive(Debug, Clone, Copy, PartialEq)]
enum Resource {
    Areas,
    Buildings,
    Categories,
    Departments,
    EventTypes,
    Groups,
    Rooms,
    SetupTypes,
    Statuses,
}

impl Resource {
    const ALL: [Resource; 9] = [
        Resource::Areas,
        Resource::Buildings,
        Resource::Categories,
        Resource::Departments,
        Resource::EventTypes,
        Resource::Groups,
        Resource::Rooms,
        Resource::SetupTypes,
        Resource::Statuses,
    ];

    fn title(self) -> &'static str {
        match self {
            Resource::Areas => "Areas",
            Resource::Buildings => "Buildings",
            Resource::Categories => "Categories",
            Resource::Departments => "Departments",
            Resource::EventTypes => "Event Types",
            Resource::Groups => "Groups",
            Resource::Rooms => "Rooms",
            Resource::SetupTypes => "Setup Types",
            Resource::Statuses => "Statuses",
        }
    }

    fn fetch(self, client: &EmsClient, page: u32) -> ems_platform_client::Result<Value> {
        let search = SearchParams {
            page: Some(page),
            page_size: Some(PAGE_SIZE),
            search_text: None,
        };
        match self {
            Resource::Areas => client.areas().list(&search),
            Resource::Buildings => client.buildings().list(&search),
            Resource::Categories => client.categories().list(&search),
            Resource::Departments => client.departments().list(&DepartmentsParams {
                page: Some(page),
                page_size: Some(PAGE_SIZE),
                ..Default::default()
            }),
            Resource::EventTypes => client.event_types().list(&EventTypesParams {
                page: Some(page),
                page_size: Some(PAGE_SIZE),
                ..Default::default()
            }),
            Resource::Groups => client.groups().list(&search),
            Resource::Rooms => client.rooms().list(&RoomsParams {
                page: Some(page),
                page_size: Some(PAGE_SIZE),
                ..Default::default()
            }),
            Resource::SetupTypes => client.setup_types().list(&search),
            Resource::Statuses => client.statuses().list(&PageParams {
                page: Some(page),
                page_size: Some(PAGE_SIZE),
            }),
        }
    }
}

/// Main application state
struct AppState {
    /// Current screen being displayed
    screen: AppScreen,
    /// API base URL entered by user
    api_url: String,
    client_id: String,
    secret: String,
    /// Focused login field
    focus: LoginField,
    /// Authenticated API client
    client: Option<EmsClient>,
    /// Currently selected resource index
    selected_resource: usize,
    /// Records of the current page
    records: Vec<Value>,
    /// Current page number (1-indexed)
    current_page: u32,
    /// Currently selected row in table
    selected_row: usize,
    /// Error message to display
    error_message: Option<String>,
    /// Should the application quit?
    should_quit: bool,
}

impl AppState {
    /// Create a new application state, prefilled from `EMS_*` variables
    fn new() -> Self {
        let env = |key: &str| std::env::var(key).unwrap_or_default();
        Self {
            screen: AppScreen::Login,
            api_url: env("EMS_BASE_URL"),
            client_id: env("EMS_CLIENT_ID"),
            secret: env("EMS_SECRET"),
            focus: LoginField::Url,
            client: None,
            selected_resource: 0,
            records: Vec::new(),
            current_page: 1,
            selected_row: 0,
            error_message: None,
            should_quit: false,
        }
    }

    fn resource(&self) -> Resource {
        Resource::ALL[self.selected_resource]
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            LoginField::Url => &mut self.api_url,
            LoginField::ClientId => &mut self.client_id,
            LoginField::Secret => &mut self.secret,
        }
    }

    /// Open an authenticated session with the entered settings
    fn connect(&mut self) -> Result<(), String> {
        let config = ClientConfig::new(self.api_url.trim())
            .with_credentials(self.client_id.trim(), self.secret.trim())
            .with_default_page_size(PAGE_SIZE);
        let client = EmsClient::new(config).map_err(|e| format!("Failed to connect: {e}"))?;
        if client.client_token().is_none() {
            return Err("Client ID and secret are required".to_string());
        }
        self.client = Some(client);
        Ok(())
    }

    /// Fetch the current page of the selected resource
    fn fetch_records(&mut self) -> Result<(), String> {
        let client = self.client.as_ref().ok_or("Client not initialized")?;
        let resource = self.resource();
        let response = resource
            .fetch(client, self.current_page)
            .map_err(|e| format!("Failed to fetch {}: {e}", resource.title()))?;
        self.records = extract_records(response);
        self.selected_row = 0;
        Ok(())
    }

    fn has_next_page(&self) -> bool {
        self.records.len() as u32 >= PAGE_SIZE
    }

    /// Clear any error message
    fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Set an error message
    fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }
}

// ============================================================================
// Terminal Setup
// ============================================================================

/// Setup the terminal for TUI mode
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to its original state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

// ============================================================================
// UI Rendering
// ============================================================================

fn render_title(f: &mut Frame, area: Rect, text: &str) {
    let title = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn render_help(f: &mut Frame, area: Rect, text: &str) {
    let help = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, area);
}

fn selected_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// Render the login screen
fn render_login(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // URL
            Constraint::Length(3), // Client ID
            Constraint::Length(3), // Secret
            Constraint::Length(2), // Help
            Constraint::Min(1),    // Spacer
            Constraint::Length(2), // Status bar
        ])
        .split(f.area());

    render_title(f, chunks[0], "EMS Platform Browser");

    let masked = "*".repeat(state.secret.chars().count());
    let fields = [
        (LoginField::Url, " API URL ", state.api_url.as_str(), chunks[1]),
        (LoginField::ClientId, " Client ID ", state.client_id.as_str(), chunks[2]),
        (LoginField::Secret, " Secret ", masked.as_str(), chunks[3]),
    ];
    for (field, label, text, area) in fields {
        let border = if field == state.focus {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        let input = Paragraph::new(text.to_string())
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .title(label)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            );
        f.render_widget(input, area);
        if field == state.focus {
            let cursor_x = area.x + text.chars().count() as u16 + 1;
            f.set_cursor_position((cursor_x, area.y + 1));
        }
    }

    render_help(f, chunks[4], "Tab: Next field | Enter: Connect | Esc: Quit");
    render_status_bar(f, chunks[6], state);
}

/// Render the loading screen
fn render_loading(f: &mut Frame, state: &AppState, message: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Loading message
            Constraint::Min(1),    // Spacer
            Constraint::Length(2), // Status bar
        ])
        .split(f.area());

    render_title(f, chunks[0], "EMS Platform Browser");

    let loading = Paragraph::new(format!("{message}..."))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(loading, chunks[1]);

    render_status_bar(f, chunks[3], state);
}

/// Render the resource selection screen
fn render_resource_selection(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(5),    // Resource list
            Constraint::Length(2), // Help
            Constraint::Length(2), // Status bar
        ])
        .split(f.area());

    render_title(f, chunks[0], "Select Resource");

    let rows: Vec<Row> = Resource::ALL
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let style = if i == state.selected_resource {
                selected_style()
            } else {
                Style::default()
            };
            Row::new(vec![Cell::from(r.title())]).style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Min(20)])
        .block(Block::default().borders(Borders::ALL).title(" Resources "));
    f.render_widget(table, chunks[1]);

    render_help(f, chunks[2], "Enter: Select | Esc: Back | q: Quit");
    render_status_bar(f, chunks[3], state);
}

/// Render the record table screen
fn render_record_table(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(5),    // Record table
            Constraint::Length(2), // Help
            Constraint::Length(2), // Status bar
        ])
        .split(f.area());

    let title = format!("{} | Page {}", state.resource().title(), state.current_page);
    render_title(f, chunks[0], &title);

    let rows: Vec<Row> = state
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let style = if i == state.selected_row {
                selected_style()
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(record_id(record)),
                Cell::from(truncate(&record_label(record), 40)),
                Cell::from(truncate(&record.to_string(), 60)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(42),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec!["ID", "Description", "Record"])
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", state.resource().title())),
    );
    f.render_widget(table, chunks[1]);

    render_help(f, chunks[2], "n: Next | p: Prev | b: Back | q: Quit");
    render_status_bar(f, chunks[3], state);
}

/// Render the status bar at the bottom
fn render_status_bar(f: &mut Frame, area: Rect, state: &AppState) {
    let status_text = if let Some(ref error) = state.error_message {
        format!(" Error: {error}")
    } else if state.client.is_some() {
        format!(" Connected to: {}", state.api_url)
    } else {
        " Not connected".to_string()
    };

    let style = if state.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    let status = Paragraph::new(status_text)
        .style(style)
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(status, area);
}

/// Main render function that dispatches to the appropriate screen renderer
fn render(f: &mut Frame, state: &AppState) {
    match state.screen {
        AppScreen::Login => render_login(f, state),
        AppScreen::Authenticating => render_loading(f, state, "Authenticating"),
        AppScreen::ResourceSelection => render_resource_selection(f, state),
        AppScreen::LoadingRecords => render_loading(f, state, "Loading records"),
        AppScreen::RecordTable => render_record_table(f, state),
    }
}

// ============================================================================
// Event Handling
// ============================================================================

/// Handle keyboard input for the login screen
fn handle_login(event: KeyEvent, state: &mut AppState) {
    match event.code {
        KeyCode::Char(c) => {
            state.focused_input().push(c);
            state.clear_error();
        }
        KeyCode::Backspace => {
            state.focused_input().pop();
            state.clear_error();
        }
        KeyCode::Tab | KeyCode::Down => {
            state.focus = state.focus.next();
        }
        KeyCode::Enter => {
            state.clear_error();
            state.screen = AppScreen::Authenticating;
        }
        KeyCode::Esc => {
            state.should_quit = true;
        }
        _ => {}
    }
}

/// Handle keyboard input for the resource selection screen
fn handle_resource_selection(event: KeyEvent, state: &mut AppState) {
    match event.code {
        KeyCode::Up => {
            state.selected_resource = state.selected_resource.saturating_sub(1);
        }
        KeyCode::Down => {
            if state.selected_resource < Resource::ALL.len() - 1 {
                state.selected_resource += 1;
            }
        }
        KeyCode::Enter => {
            state.current_page = 1;
            state.screen = AppScreen::LoadingRecords;
        }
        KeyCode::Esc => {
            state.client = None;
            state.screen = AppScreen::Login;
        }
        _ => {}
    }
}

/// Handle keyboard input for the record table screen
fn handle_record_table(event: KeyEvent, state: &mut AppState) {
    match event.code {
        KeyCode::Up => {
            state.selected_row = state.selected_row.saturating_sub(1);
        }
        KeyCode::Down => {
            if state.selected_row < state.records.len().saturating_sub(1) {
                state.selected_row += 1;
            }
        }
        KeyCode::Char('n') => {
            if state.has_next_page() {
                state.current_page += 1;
                state.screen = AppScreen::LoadingRecords;
            }
        }
        KeyCode::Char('p') => {
            if state.current_page > 1 {
                state.current_page -= 1;
                state.screen = AppScreen::LoadingRecords;
            }
        }
        KeyCode::Char('b') | KeyCode::Esc => {
            state.screen = AppScreen::ResourceSelection;
            state.clear_error();
        }
        _ => {}
    }
}

/// Main event handler that dispatches to the appropriate screen handler
fn handle_event(event: Event, state: &mut AppState) {
    if let Event::Key(key_event) = event {
        // 'q' quits everywhere except the login form, where it is text
        if key_event.code == KeyCode::Char('q')
            && state.screen != AppScreen::Login
            && key_event.modifiers == KeyModifiers::NONE
        {
            state.should_quit = true;
            return;
        }

        match state.screen {
            AppScreen::Login => handle_login(key_event, state),
            AppScreen::ResourceSelection => handle_resource_selection(key_event, state),
            AppScreen::RecordTable => handle_record_table(key_event, state),
            _ => {}
        }
    }
}

// ============================================================================
// Application Logic
// ============================================================================

/// Process the current state (e.g., fetch data during loading screens)
fn process_state(state: &mut AppState) {
    match state.screen {
        AppScreen::Authenticating => match state.connect() {
            Ok(()) => {
                state.selected_resource = 0;
                state.screen = AppScreen::ResourceSelection;
            }
            Err(e) => {
                state.set_error(e);
                state.screen = AppScreen::Login;
            }
        },
        AppScreen::LoadingRecords => match state.fetch_records() {
            Ok(()) => state.screen = AppScreen::RecordTable,
            Err(e) => {
                state.set_error(e);
                state.screen = AppScreen::ResourceSelection;
            }
        },
        _ => {}
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Pull the record list out of a list response: either a bare array or the
/// first array-valued field of an envelope object
fn extract_records(response: Value) -> Vec<Value> {
    match response {
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn record_id(record: &Value) -> String {
    match record.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => "-".to_string(),
    }
}

fn record_label(record: &Value) -> String {
    ["description", "name", "displayName", "code"]
        .iter()
        .find_map(|key| record.get(*key).and_then(|v| v.as_str()))
        .unwrap_or("")
        .to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max - 3).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

// ============================================================================
// Main Application
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = setup_terminal()?;
    let mut state = AppState::new();

    loop {
        terminal.draw(|f| render(f, &state))?;

        // Process any state transitions (e.g., loading -> loaded)
        process_state(&mut state);

        if state.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            let event = event::read()?;
            handle_event(event, &mut state);
        }
    }

    restore_terminal(&mut terminal)?;

    Ok(())
}
