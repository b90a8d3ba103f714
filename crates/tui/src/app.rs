use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use stockroom_core::{
    inventory::{self, ItemForm, PendingRemoval, PurchaseRequest},
    AdminSession, InventoryDocument, InventoryError, LoadOutcome, LoginOutcome, Storage,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_FIELD_LEN: usize = 64;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Stock,
    Logs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Categories,
    Items,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Single-line text input. The cursor counts characters, not bytes.
#[derive(Debug, Clone)]
struct TextField {
    label: &'static str,
    input: String,
    cursor: usize,
    masked: bool,
}

impl TextField {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            input: String::new(),
            cursor: 0,
            masked: false,
        }
    }

    fn masked(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::new(label)
        }
    }

    fn with_value(mut self, value: &str) -> Self {
        self.input = value.chars().take(MAX_FIELD_LEN).collect();
        self.cursor = self.len();
        self
    }

    fn len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.input.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.len();
    }

    fn insert(&mut self, ch: char) {
        if self.len() >= MAX_FIELD_LEN || ch.is_control() {
            return;
        }
        let idx = self.byte_index();
        self.input.insert(idx, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let idx = self.byte_index();
        self.input.remove(idx);
    }

    fn delete(&mut self) {
        if self.cursor < self.len() {
            let idx = self.byte_index();
            self.input.remove(idx);
        }
    }

    fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.len())
        } else {
            self.input.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    Purchase,
    Login,
    AddItem,
    UpdateItem,
    RemoveItem,
}

#[derive(Debug, Clone)]
struct FormModal {
    kind: FormKind,
    category: String,
    item: String,
    fields: Vec<TextField>,
    focus: usize,
}

impl FormModal {
    fn new(kind: FormKind, category: &str, item: &str, fields: Vec<TextField>) -> Self {
        Self {
            kind,
            category: category.to_string(),
            item: item.to_string(),
            fields,
            focus: 0,
        }
    }

    fn purchase(category: &str, item: &str, last_user: &str) -> Self {
        let mut form = Self::new(
            FormKind::Purchase,
            category,
            item,
            vec![
                TextField::new("Username").with_value(last_user),
                TextField::new("Quantity"),
            ],
        );
        if !last_user.is_empty() {
            form.focus = 1;
        }
        form
    }

    fn login() -> Self {
        Self::new(FormKind::Login, "", "", vec![TextField::masked("Password")])
    }

    fn add_item(category: &str) -> Self {
        Self::new(
            FormKind::AddItem,
            category,
            "",
            vec![
                TextField::new("Item name"),
                TextField::new("Price"),
                TextField::new("Count"),
            ],
        )
    }

    fn update_item(category: &str, item: &str) -> Self {
        Self::new(
            FormKind::UpdateItem,
            category,
            item,
            vec![
                TextField::new("Item name").with_value(item),
                TextField::new("Price"),
                TextField::new("Count"),
            ],
        )
    }

    fn remove_item(category: &str, item: &str) -> Self {
        Self::new(
            FormKind::RemoveItem,
            category,
            item,
            vec![TextField::new("Item name").with_value(item)],
        )
    }

    fn title(&self) -> String {
        match self.kind {
            FormKind::Purchase if self.item.is_empty() => "Purchase".to_string(),
            FormKind::Purchase => format!("Purchase {} ({})", self.item, self.category),
            FormKind::Login => "Admin Login".to_string(),
            FormKind::AddItem => format!("Add Item to {}", self.category),
            FormKind::UpdateItem => format!("Update Item in {}", self.category),
            FormKind::RemoveItem => format!("Remove Item from {}", self.category),
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self.kind {
            FormKind::UpdateItem => Some("Leave price or count blank to keep the stored value."),
            _ => None,
        }
    }

    fn field(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.input.as_str())
            .unwrap_or("")
    }

    fn focused_mut(&mut self) -> Option<&mut TextField> {
        self.fields.get_mut(self.focus)
    }

    fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal frontend over the inventory document.
pub struct StockroomApp {
    storage: Storage,
    document: InventoryDocument,
    session: AdminSession,
    state: UiState,
    form: Option<FormModal>,
    confirm: Option<PendingRemoval>,
    log_text: String,
    theme: Theme,
}

impl StockroomApp {
    pub fn new(storage: Storage, session: AdminSession) -> Result<Self> {
        let outcome = storage
            .store
            .load()
            .context("failed to load inventory")?;
        let mut app = Self {
            storage,
            document: InventoryDocument::default(),
            session,
            state: UiState::default(),
            form: None,
            confirm: None,
            log_text: String::new(),
            theme: Theme::default(),
        };
        app.apply_load(outcome, "Loaded");
        Ok(app)
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal).await;
        restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) || self.state.should_quit {
                break;
            }
        }
        info!("Stockroom exiting");
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Event::Key(key) = event {
                    self.handle_key(key);
                }
                true
            }
            Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn apply_load(&mut self, outcome: LoadOutcome, verb: &str) {
        let warning = outcome.warning();
        self.document = outcome.document;
        self.state.clamp(&self.document);
        match warning {
            Some(message) => {
                warn!("{message}");
                self.state.set_status(StatusKind::Warning, message);
            }
            None => self.state.set_status(
                StatusKind::Info,
                format!(
                    "{verb} {} items in {} categories",
                    self.document.item_count(),
                    self.document.categories().len()
                ),
            ),
        }
    }

    fn selected_category(&self) -> String {
        self.document
            .category_names()
            .get(self.state.category_cursor)
            .map(|name| name.to_string())
            .unwrap_or_default()
    }

    fn selected_item(&self) -> String {
        self.document
            .item_names(&self.selected_category())
            .get(self.state.item_cursor)
            .map(|name| name.to_string())
            .unwrap_or_default()
    }

    fn report(&mut self, err: InventoryError) {
        match &err {
            InventoryError::Validation(_) | InventoryError::AccessDenied => {}
            _ => error!(?err, "Inventory operation failed"),
        }
        self.state.set_status(StatusKind::Error, err.to_string());
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return;
        }
        if self.confirm.is_some() {
            self.handle_confirm_key(key);
        } else if self.form.is_some() {
            self.handle_form_key(key);
        } else {
            match self.state.screen {
                Screen::Stock => self.handle_stock_key(key),
                Screen::Logs => self.handle_logs_key(key),
            }
        }
    }

    fn handle_stock_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => self.state.toggle_focus(),
            KeyCode::Left => self.state.focus = Focus::Categories,
            KeyCode::Right => self.state.focus = Focus::Items,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Enter | KeyCode::Char('p') => {
                let form = FormModal::purchase(
                    &self.selected_category(),
                    &self.selected_item(),
                    &self.state.last_user,
                );
                self.form = Some(form);
            }
            KeyCode::Char('l') => self.form = Some(FormModal::login()),
            KeyCode::Char('a') => self.open_admin_form(FormKind::AddItem),
            KeyCode::Char('u') => self.open_admin_form(FormKind::UpdateItem),
            KeyCode::Char('d') => self.open_admin_form(FormKind::RemoveItem),
            KeyCode::Char('r') => match inventory::reload(&self.storage) {
                Ok(outcome) => self.apply_load(outcome, "Reloaded"),
                Err(err) => self.report(err),
            },
            KeyCode::Char('x') => match inventory::export(&self.document, &self.storage) {
                Ok(path) => self.state.set_status(
                    StatusKind::Success,
                    format!("Inventory saved to {}.", path.display()),
                ),
                Err(err) => self.report(err),
            },
            KeyCode::Char('v') => self.open_logs(),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        match self.state.focus {
            Focus::Categories => {
                let total = self.document.categories().len();
                self.state.category_cursor = step(self.state.category_cursor, delta, total);
                self.state.item_cursor = 0;
            }
            Focus::Items => {
                let total = self.document.item_names(&self.selected_category()).len();
                self.state.item_cursor = step(self.state.item_cursor, delta, total);
            }
        }
    }

    fn open_admin_form(&mut self, kind: FormKind) {
        if let Err(err) = self.session.require_admin() {
            self.state.set_status(
                StatusKind::Error,
                format!("{err} Press 'l' to log in as admin."),
            );
            return;
        }
        let category = self.selected_category();
        let item = self.selected_item();
        let form = match kind {
            FormKind::AddItem => FormModal::add_item(&category),
            FormKind::UpdateItem => FormModal::update_item(&category, &item),
            FormKind::RemoveItem => FormModal::remove_item(&category, &item),
            FormKind::Purchase | FormKind::Login => return,
        };
        self.form = Some(form);
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(mut form) = self.form.take() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.state
                    .set_status(StatusKind::Info, format!("{} cancelled", form.title()));
                return;
            }
            KeyCode::Enter => {
                self.form = self.submit_form(form);
                return;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            _ => {
                if let Some(field) = form.focused_mut() {
                    match key.code {
                        KeyCode::Left => field.move_cursor(-1),
                        KeyCode::Right => field.move_cursor(1),
                        KeyCode::Home => field.move_home(),
                        KeyCode::End => field.move_end(),
                        KeyCode::Backspace => field.backspace(),
                        KeyCode::Delete => field.delete(),
                        KeyCode::Char(ch)
                            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
                        {
                            field.insert(ch)
                        }
                        _ => {}
                    }
                }
            }
        }
        self.form = Some(form);
    }

    /// Run the operation behind `form`. Returns the form when it should stay
    /// open so the user can correct the input.
    fn submit_form(&mut self, form: FormModal) -> Option<FormModal> {
        let category = form.category.as_str();
        let result = match form.kind {
            FormKind::Login => {
                let outcome = self.session.login(form.field(0));
                let kind = match outcome {
                    LoginOutcome::Granted => StatusKind::Success,
                    LoginOutcome::Denied => StatusKind::Error,
                };
                self.state.set_status(kind, outcome.message().to_string());
                return None;
            }
            FormKind::Purchase => {
                let request = PurchaseRequest {
                    user: form.field(0),
                    category,
                    item: &form.item,
                    quantity: form.field(1),
                };
                inventory::purchase(&mut self.document, &self.storage, request).map(|receipt| {
                    self.state.last_user = receipt.entry.user.clone();
                    receipt.message()
                })
            }
            FormKind::AddItem => {
                let item_form = ItemForm {
                    category,
                    name: form.field(0),
                    price: form.field(1),
                    count: form.field(2),
                };
                inventory::add_item(&mut self.document, &self.storage, item_form)
                    .map(|change| change.message())
            }
            FormKind::UpdateItem => {
                let item_form = ItemForm {
                    category,
                    name: form.field(0),
                    price: form.field(1),
                    count: form.field(2),
                };
                inventory::update_item(&mut self.document, &self.storage, item_form)
                    .map(|change| change.message())
            }
            FormKind::RemoveItem => {
                match inventory::plan_removal(&self.document, category, form.field(0)) {
                    Ok(pending) => {
                        self.state.set_status(StatusKind::Warning, pending.prompt());
                        self.confirm = Some(pending);
                        return None;
                    }
                    Err(err) => Err(err),
                }
            }
        };

        match result {
            Ok(message) => {
                self.state.clamp(&self.document);
                self.state.set_status(StatusKind::Success, message);
                None
            }
            Err(err @ InventoryError::Validation(_)) => {
                self.report(err);
                Some(form)
            }
            Err(err) => {
                self.state.clamp(&self.document);
                self.report(err);
                None
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let confirmed = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
            _ => return,
        };
        let Some(pending) = self.confirm.take() else {
            return;
        };
        match pending.resolve(&mut self.document, &self.storage, confirmed) {
            Ok(outcome) => {
                self.state.clamp(&self.document);
                let kind = if confirmed {
                    StatusKind::Success
                } else {
                    StatusKind::Info
                };
                self.state.set_status(kind, outcome.message());
            }
            Err(err) => self.report(err),
        }
    }

    fn open_logs(&mut self) {
        match self.storage.log.read_all() {
            Ok(text) => {
                self.log_text = text;
                self.state.screen = Screen::Logs;
                self.state.log_scroll = 0;
                let count = self.log_text.lines().count();
                self.state
                    .set_status(StatusKind::Info, format!("{count} purchases logged"));
            }
            Err(err) => self.report(err),
        }
    }

    fn handle_logs_key(&mut self, key: KeyEvent) {
        let total = self.log_text.lines().count();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') => {
                self.state.screen = Screen::Stock;
                self.state
                    .set_status(StatusKind::Info, "Returned to stock view".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.log_scroll = step(self.state.log_scroll, 1, total);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.log_scroll = step(self.state.log_scroll, -1, total);
            }
            KeyCode::Char('g') | KeyCode::Home => self.state.log_scroll = 0,
            KeyCode::Char('G') | KeyCode::End => {
                self.state.log_scroll = total.saturating_sub(1);
            }
            KeyCode::Char('r') => self.open_logs(),
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        match self.state.screen {
            Screen::Stock => self.draw_stock(frame, chunks[1]),
            Screen::Logs => self.draw_logs(frame, chunks[1]),
        }
        self.render_status(frame, chunks[2]);

        if let Some(form) = &self.form {
            self.render_form(frame, form);
        }
        if let Some(pending) = &self.confirm {
            self.render_confirm(frame, pending);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let badge = if self.session.is_authenticated() {
            Span::styled(
                " ADMIN ",
                Style::default()
                    .fg(Color::Black)
                    .bg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(" customer ", Style::default().fg(self.theme.muted))
        };
        let line = Line::from(vec![
            Span::styled(
                "Stockroom",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            badge,
            Span::raw("  "),
            Span::styled(
                self.storage.store.path().display().to_string(),
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn draw_stock(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);
        let lists = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(columns[0]);

        let category = self.selected_category();
        let categories: Vec<String> = self
            .document
            .category_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let items: Vec<String> = self
            .document
            .category(&category)
            .map(|contents| {
                contents
                    .items()
                    .iter()
                    .map(|item| {
                        format!(
                            "{}  ({} @ {:.2})",
                            item.name, item.record.count, item.record.price
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        self.render_list(
            frame,
            lists[0],
            "Categories",
            &categories,
            self.state.category_cursor,
            self.state.focus == Focus::Categories,
        );
        let items_title = if category.is_empty() {
            "Items".to_string()
        } else {
            format!("Items in {category}")
        };
        self.render_list(
            frame,
            lists[1],
            &items_title,
            &items,
            self.state.item_cursor,
            self.state.focus == Focus::Items,
        );
        self.render_stock_report(frame, columns[1]);
    }

    fn render_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        entries: &[String],
        cursor: usize,
        focused: bool,
    ) {
        let mut list_state = ListState::default();
        if !entries.is_empty() {
            list_state.select(Some(cursor.min(entries.len() - 1)));
        }
        let items: Vec<ListItem> = if entries.is_empty() {
            vec![ListItem::new(Span::styled(
                "-- no items --",
                Style::default().fg(self.theme.muted),
            ))]
        } else {
            entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    let marker = if idx == cursor && focused {
                        Span::styled(
                            "▶ ",
                            Style::default()
                                .fg(self.theme.accent)
                                .add_modifier(Modifier::BOLD),
                        )
                    } else {
                        Span::raw("  ")
                    };
                    let label =
                        Span::styled(entry.clone(), Style::default().fg(self.theme.primary_fg));
                    ListItem::new(Line::from(vec![marker, label]))
                })
                .collect()
        };
        let border_style = if focused {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title.to_string());
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_stock_report(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .document
            .stock_report()
            .into_iter()
            .map(|line| {
                if line.starts_with("---") {
                    Line::from(Span::styled(
                        line,
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else if line == "No items available." {
                    Line::from(Span::styled(line, Style::default().fg(self.theme.muted)))
                } else {
                    Line::from(line)
                }
            })
            .collect();
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Stock"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_logs(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = if self.log_text.trim().is_empty() {
            vec![Line::from(Span::styled(
                "No purchases logged yet.",
                Style::default().fg(self.theme.muted),
            ))]
        } else {
            self.log_text.lines().map(Line::from).collect()
        };
        let title = format!("Purchase Log - {}", self.storage.log.path().display());
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .scroll((self.state.log_scroll.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let color = match self.state.status_kind {
            StatusKind::Info => self.theme.primary_fg,
            StatusKind::Success => self.theme.success,
            StatusKind::Warning => self.theme.warning,
            StatusKind::Error => self.theme.danger,
        };
        let help = match self.state.screen {
            Screen::Stock => {
                "Tab switch  j/k move  p buy  l login  a/u/d add/update/remove  r reload  v logs  x export  q quit"
            }
            Screen::Logs => "j/k scroll  g/G top/bottom  r refresh  Esc back",
        };
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                self.state.status.clone(),
                Style::default().fg(color),
            )),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_form(&self, frame: &mut Frame, form: &FormModal) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(60_u16, frame_area.width.saturating_sub(4)), 24);
        let extra = if form.hint().is_some() { 1 } else { 0 };
        let height = (form.fields.len() as u16 + 4 + extra).min(frame_area.height);
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let label_width = form
            .fields
            .iter()
            .map(|field| field.label.chars().count())
            .max()
            .unwrap_or(0);
        let mut lines: Vec<Line> = form
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let focused = idx == form.focus;
                let marker = if focused {
                    Span::styled("▶ ", Style::default().fg(self.theme.accent))
                } else {
                    Span::raw("  ")
                };
                let label_style = if focused {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                Line::from(vec![
                    marker,
                    Span::styled(
                        format!("{:<width$}: ", field.label, width = label_width),
                        label_style,
                    ),
                    Span::raw(field.display()),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        if let Some(hint) = form.hint() {
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" submit  "),
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" next field  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(form.title()));
        frame.render_widget(paragraph, area);

        if let Some(field) = form.fields.get(form.focus) {
            let offset = 2 + label_width + 2 + field.cursor;
            let cursor_x = (area.x + 1 + offset as u16).min(area.x + area.width.saturating_sub(2));
            let cursor_y = area.y + 1 + form.focus as u16;
            frame.set_cursor(cursor_x, cursor_y);
        }
    }

    fn render_confirm(&self, frame: &mut Frame, pending: &PendingRemoval) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(56_u16, frame_area.width.saturating_sub(4)), 24);
        let area = centered_rect(width, 6, frame_area);
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(pending.prompt()),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    "y",
                    Style::default()
                        .fg(self.theme.danger)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" remove  "),
                Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" keep"),
            ]),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Confirm"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    screen: Screen,
    focus: Focus,
    category_cursor: usize,
    item_cursor: usize,
    log_scroll: usize,
    last_user: String,
    status: String,
    status_kind: StatusKind,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Stock,
            focus: Focus::Categories,
            category_cursor: 0,
            item_cursor: 0,
            log_scroll: 0,
            last_user: String::new(),
            status: "Ready".to_string(),
            status_kind: StatusKind::Info,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, kind: StatusKind, message: String) {
        self.status_kind = kind;
        self.status = message;
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Categories => Focus::Items,
            Focus::Items => Focus::Categories,
        };
    }

    /// Keep both cursors inside the current document after it changed.
    fn clamp(&mut self, document: &InventoryDocument) {
        let categories = document.category_names();
        self.category_cursor = self
            .category_cursor
            .min(categories.len().saturating_sub(1));
        let items = categories
            .get(self.category_cursor)
            .map(|name| document.item_names(name).len())
            .unwrap_or(0);
        self.item_cursor = self.item_cursor.min(items.saturating_sub(1));
    }
}

fn step(current: usize, delta: isize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let next = current as isize + delta;
    next.clamp(0, total as isize - 1) as usize
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
