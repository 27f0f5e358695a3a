// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use showroom_app::{
    AppCommand, AppMode, AppState, CollectionView, Facet, FetchOutcome, FetchTicket, FieldFormat,
    FilterChoice, LeadForm, LeadFormKind, LeadSubmission, ListingItem, ListingRecord, LoadState,
    PageKind, SubmitState, ViewCommand, ViewEvent,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);

/// Backend seam for the showroom screens. The default `spawn_*` methods run
/// the blocking call inline and post the result to the event channel;
/// runtimes that own a network client override them to run on a thread.
pub trait PageRuntime {
    fn load_page(&mut self, page: PageKind, ticket: &FetchTicket) -> FetchOutcome<ListingRecord>;
    fn list_models(&mut self) -> Result<Vec<String>>;
    fn list_categories(&mut self) -> Result<Vec<String>>;
    /// `Ok` carries the server's success message, `Err` its failure
    /// message; either may be absent.
    fn submit_lead(
        &mut self,
        submission: &LeadSubmission,
    ) -> std::result::Result<Option<String>, Option<String>>;

    fn resolve_media(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        (!reference.is_empty()).then(|| reference.to_owned())
    }

    fn currency(&self) -> &str {
        "$"
    }

    fn spawn_fetch(
        &mut self,
        page: PageKind,
        ticket: FetchTicket,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let outcome = self.load_page(page, &ticket);
        tx.send(InternalEvent::Fetched {
            page,
            request_id: ticket.request_id,
            outcome,
        })
        .map_err(|_| anyhow!("page fetch channel closed"))
    }

    fn spawn_models(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let models = self.list_models().map_err(|error| error.to_string());
        tx.send(InternalEvent::Models(models))
            .map_err(|_| anyhow!("model list channel closed"))
    }

    fn spawn_categories(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let categories = self.list_categories().map_err(|error| error.to_string());
        tx.send(InternalEvent::Categories(categories))
            .map_err(|_| anyhow!("category list channel closed"))
    }

    fn spawn_submit(
        &mut self,
        request_id: u64,
        submission: LeadSubmission,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let outcome = self.submit_lead(&submission);
        tx.send(InternalEvent::Submitted {
            request_id,
            outcome,
        })
        .map_err(|_| anyhow!("form submit channel closed"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    Fetched {
        page: PageKind,
        request_id: u64,
        outcome: FetchOutcome<ListingRecord>,
    },
    Models(std::result::Result<Vec<String>, String>),
    Categories(std::result::Result<Vec<String>, String>),
    Submitted {
        request_id: u64,
        outcome: std::result::Result<Option<String>, Option<String>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct FormUiState {
    form: LeadForm,
    field_index: usize,
    in_flight: Option<u64>,
}

impl FormUiState {
    fn new(form: LeadForm) -> Self {
        Self {
            form,
            field_index: 0,
            in_flight: None,
        }
    }

    fn current_key(&self) -> Option<&'static str> {
        self.form
            .kind()
            .fields()
            .get(self.field_index)
            .map(|spec| spec.key)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    views: [CollectionView<ListingRecord>; 10],
    cursors: [usize; 10],
    dropdown_cursor: usize,
    form: Option<FormUiState>,
    form_picker: Option<usize>,
    detail_media: Vec<String>,
    models: Vec<String>,
    help_visible: bool,
    status_token: u64,
    next_submit_id: u64,
    currency: String,
}

impl ViewData {
    fn new(currency: &str) -> Self {
        Self {
            views: PageKind::ALL.map(|page| CollectionView::new(page.view_config())),
            cursors: [0; 10],
            dropdown_cursor: 0,
            form: None,
            form_picker: None,
            detail_media: Vec::new(),
            models: Vec::new(),
            help_visible: false,
            status_token: 0,
            next_submit_id: 0,
            currency: currency.to_owned(),
        }
    }

    fn view(&self, page: PageKind) -> &CollectionView<ListingRecord> {
        &self.views[page as usize]
    }

    fn view_mut(&mut self, page: PageKind) -> &mut CollectionView<ListingRecord> {
        &mut self.views[page as usize]
    }

    fn cursor(&self, page: PageKind) -> usize {
        self.cursors[page as usize]
    }

    fn set_cursor(&mut self, page: PageKind, cursor: usize) {
        let rows = self.view(page).rows().len();
        self.cursors[page as usize] = cursor.min(rows.saturating_sub(1));
    }

    fn record_at_cursor(&self, page: PageKind) -> Option<&ListingRecord> {
        self.view(page).rows().get(self.cursor(page)).copied()
    }

    /// Hands a backend option list to every page that filters on `facet`
    /// server-side.
    fn publish_options(&mut self, facet: Facet, values: &[String]) {
        for page in PageKind::ALL {
            if page.view_config().remote_filters.contains(&facet) {
                self.view_mut(page)
                    .set_published_options(facet, values.to_vec());
            }
        }
    }
}

/// Runs the terminal UI. `start_model` preselects the model on a page that
/// is listed per model.
pub fn run_app<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    start_model: Option<String>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(runtime.currency());
    let (internal_tx, internal_rx) = mpsc::channel();

    request_models(state, runtime, &mut view_data, &internal_tx);
    request_categories(runtime, &internal_tx);
    open_start_page(state, runtime, &mut view_data, &internal_tx, start_model);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event
            && let Event::Key(key) = event::read().context("read event")?
            && handle_key_event(state, runtime, &mut view_data, &internal_tx, key)
        {
            break;
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Fetched {
                page,
                request_id,
                outcome,
            } => {
                let events = view_data.view_mut(page).apply_response(request_id, outcome);
                handle_view_events(state, runtime, view_data, tx, page, events);
            }
            InternalEvent::Models(Ok(models)) => {
                debug!(count = models.len(), "model list loaded");
                view_data.publish_options(Facet::Model, &models);
                view_data.models = models;
                for page in PageKind::ALL {
                    if !page.view_config().requires_path_param
                        || view_data.view(page).path_param().is_some()
                    {
                        continue;
                    }
                    if let Some(first) = view_data.models.first().cloned() {
                        dispatch_view(
                            state,
                            runtime,
                            view_data,
                            tx,
                            page,
                            ViewCommand::SetPathParam(Some(first)),
                        );
                    }
                }
            }
            InternalEvent::Models(Err(error)) => {
                warn!(%error, "model list unavailable");
                emit_status(state, view_data, tx, format!("model list unavailable: {error}"));
            }
            InternalEvent::Categories(Ok(categories)) => {
                debug!(count = categories.len(), "category list loaded");
                view_data.publish_options(Facet::Category, &categories);
            }
            InternalEvent::Categories(Err(error)) => {
                warn!(%error, "category list unavailable; dropdown falls back to loaded rows");
            }
            InternalEvent::Submitted {
                request_id,
                outcome,
            } => {
                let Some(form_ui) = view_data.form.as_mut() else {
                    continue;
                };
                if form_ui.in_flight != Some(request_id) {
                    debug!(request_id, "dropping stale submit result");
                    continue;
                }
                form_ui.in_flight = None;
                let succeeded = outcome.is_ok();
                let message = form_ui.form.finish_submit(outcome);
                if succeeded {
                    form_ui.field_index = 0;
                }
                emit_status(state, view_data, tx, message);
            }
        }
    }
}

fn schedule_status_clear(tx: &Sender<InternalEvent>, token: u64) {
    let tx = tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = tx.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(tx, view_data.status_token);
}

fn request_models<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    if let Err(error) = runtime.spawn_models(tx.clone()) {
        emit_status(state, view_data, tx, format!("model list failed: {error}"));
    }
}

fn request_categories<R: PageRuntime>(runtime: &mut R, tx: &Sender<InternalEvent>) {
    if let Err(error) = runtime.spawn_categories(tx.clone()) {
        warn!(%error, "category list request failed");
    }
}

/// First load of the start page, with its model preselected when one was
/// asked for.
fn open_start_page<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    start_model: Option<String>,
) {
    let page = state.active_page;
    if let Some(model) = start_model {
        if page.view_config().requires_path_param {
            dispatch_view(
                state,
                runtime,
                view_data,
                tx,
                page,
                ViewCommand::SetPathParam(Some(model)),
            );
        } else {
            warn!(page = page.label(), %model, "page is not listed per model; ignoring model");
        }
    }
    ensure_loaded(state, runtime, view_data, tx);
}

fn request_fetch<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    page: PageKind,
) {
    let view = view_data.view_mut(page);
    if !view.can_fetch() {
        return;
    }
    let ticket = view.begin_fetch();
    let request_id = ticket.request_id;
    debug!(page = page.label(), request_id, "fetching page");
    if let Err(error) = runtime.spawn_fetch(page, ticket, tx.clone()) {
        let events = view_data
            .view_mut(page)
            .apply_response(request_id, FetchOutcome::Failed(error.to_string()));
        handle_view_events(state, runtime, view_data, tx, page, events);
    }
}

/// Loads the active page the first time it is shown.
fn ensure_loaded<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let page = state.active_page;
    let view = view_data.view(page);
    if view.has_loaded() {
        return;
    }
    if !view.can_fetch() {
        if view_data.models.is_empty() {
            emit_status(state, view_data, tx, "waiting for the model list -- press r to retry");
        }
        return;
    }
    request_fetch(state, runtime, view_data, tx, page);
}

fn dispatch_view<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    page: PageKind,
    command: ViewCommand,
) {
    let events = view_data.view_mut(page).dispatch(command);
    handle_view_events(state, runtime, view_data, tx, page, events);
}

fn handle_view_events<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    page: PageKind,
    events: Vec<ViewEvent>,
) {
    let active = page == state.active_page;
    for event in events {
        match event {
            ViewEvent::RefetchNeeded if active => {
                request_fetch(state, runtime, view_data, tx, page);
            }
            ViewEvent::DetailOpened(_) if active => {
                view_data.detail_media = view_data
                    .view(page)
                    .selected()
                    .map(|record| {
                        record
                            .media_refs()
                            .into_iter()
                            .filter_map(|reference| runtime.resolve_media(reference))
                            .collect()
                    })
                    .unwrap_or_default();
                state.dispatch(AppCommand::OpenDetail);
            }
            ViewEvent::DetailClosed => {
                view_data.detail_media.clear();
                if active {
                    state.dispatch(AppCommand::CloseDetail);
                }
            }
            ViewEvent::NotFound(message) | ViewEvent::LoadFailed(message) if active => {
                emit_status(state, view_data, tx, format!("{}: {message}", page.label()));
            }
            ViewEvent::StaleResponseDropped(request_id) => {
                debug!(page = page.label(), request_id, "dropped stale response");
            }
            _ => {}
        }
    }
    let cursor = view_data.cursor(page);
    view_data.set_cursor(page, cursor);
}

fn handle_key_event<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.form_picker.is_some() {
        handle_form_picker_key(state, view_data, key);
        return false;
    }

    match state.mode {
        AppMode::Form(_) => {
            handle_form_key(state, runtime, view_data, tx, key);
            return false;
        }
        AppMode::Detail => {
            handle_detail_key(state, runtime, view_data, tx, key);
            return false;
        }
        AppMode::Browse => {}
    }

    if view_data.view(state.active_page).dropdown().is_some() {
        handle_dropdown_key(state, runtime, view_data, tx, key);
        return false;
    }

    handle_browse_key(state, runtime, view_data, tx, key)
}

fn handle_browse_key<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let page = state.active_page;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => change_page(state, runtime, view_data, tx, AppCommand::NextPage),
        KeyCode::BackTab => change_page(state, runtime, view_data, tx, AppCommand::PrevPage),
        KeyCode::Char(digit @ '0'..='9') => {
            let index = match digit.to_digit(10) {
                Some(0) => 9,
                Some(value) => value as usize - 1,
                None => return false,
            };
            if let Some(target) = PageKind::ALL.get(index).copied() {
                change_page(state, runtime, view_data, tx, AppCommand::GoToPage(target));
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            let cursor = view_data.cursor(page).saturating_add(1);
            view_data.set_cursor(page, cursor);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            let cursor = view_data.cursor(page).saturating_sub(1);
            view_data.set_cursor(page, cursor);
        }
        KeyCode::Enter => {
            if page.view_config().accordion {
                let cursor = view_data.cursor(page);
                dispatch_view(
                    state,
                    runtime,
                    view_data,
                    tx,
                    page,
                    ViewCommand::ToggleAccordion(cursor),
                );
            } else if let Some(key) = view_data
                .record_at_cursor(page)
                .map(|record| record.key().to_owned())
            {
                dispatch_view(state, runtime, view_data, tx, page, ViewCommand::Select(key));
            }
        }
        KeyCode::Char(']') => cycle_group(state, runtime, view_data, tx, 1),
        KeyCode::Char('[') => cycle_group(state, runtime, view_data, tx, -1),
        KeyCode::Char('f') => {
            let Some(facet) = page.view_config().filters.first().copied() else {
                emit_status(state, view_data, tx, format!("{} has no filters", page.label()));
                return false;
            };
            open_dropdown(state, runtime, view_data, tx, facet);
        }
        KeyCode::Char('x') => {
            dispatch_view(state, runtime, view_data, tx, page, ViewCommand::ResetFilters);
        }
        KeyCode::Char('m') => cycle_model(state, runtime, view_data, tx),
        KeyCode::Char('e') => {
            let record = view_data.record_at_cursor(page).cloned();
            open_enquiry(state, view_data, tx, page, record.as_ref());
        }
        KeyCode::Char('c') => view_data.form_picker = Some(0),
        KeyCode::Char('r') => {
            let config = page.view_config();
            if (config.requires_path_param || config.remote_filters.contains(&Facet::Model))
                && view_data.models.is_empty()
            {
                request_models(state, runtime, view_data, tx);
            }
            if config.remote_filters.contains(&Facet::Category) {
                request_categories(runtime, tx);
            }
            request_fetch(state, runtime, view_data, tx, page);
        }
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
    false
}

fn change_page<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let previous = state.active_page;
    state.dispatch(command);
    if state.active_page == previous {
        return;
    }
    if view_data.view(previous).detail_open() {
        view_data.view_mut(previous).dispatch(ViewCommand::CloseDetail);
        view_data.detail_media.clear();
    }
    ensure_loaded(state, runtime, view_data, tx);
}

fn cycle_group<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    delta: isize,
) {
    let page = state.active_page;
    let view = view_data.view(page);
    let keys = view
        .groups()
        .into_iter()
        .map(|group| group.key)
        .collect::<Vec<_>>();
    if keys.is_empty() {
        return;
    }
    let current = view
        .active_group()
        .and_then(|active| keys.iter().position(|key| key == active))
        .unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(keys.len() as isize) as usize;
    let key = keys[next].clone();
    dispatch_view(state, runtime, view_data, tx, page, ViewCommand::SelectGroup(key));
    view_data.set_cursor(page, 0);
}

fn open_dropdown<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    facet: Facet,
) {
    let page = state.active_page;
    dispatch_view(state, runtime, view_data, tx, page, ViewCommand::ToggleDropdown(facet));
    let view = view_data.view(page);
    let current = view.filters().choice(facet);
    view_data.dropdown_cursor = view
        .filter_options(facet)
        .iter()
        .position(|option| *option == current)
        .unwrap_or(0);
}

fn handle_dropdown_key<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let page = state.active_page;
    let Some(facet) = view_data.view(page).dropdown() else {
        return;
    };
    let options = view_data.view(page).filter_options(facet);
    match key.code {
        KeyCode::Esc => {
            dispatch_view(state, runtime, view_data, tx, page, ViewCommand::ToggleDropdown(facet));
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_data.dropdown_cursor =
                (view_data.dropdown_cursor + 1).min(options.len().saturating_sub(1));
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.dropdown_cursor = view_data.dropdown_cursor.saturating_sub(1);
        }
        KeyCode::Tab | KeyCode::Char('f') => {
            let filters = page.view_config().filters;
            let index = filters.iter().position(|f| *f == facet).unwrap_or(0);
            let next = filters[(index + 1) % filters.len()];
            if next == facet {
                return;
            }
            open_dropdown(state, runtime, view_data, tx, next);
        }
        KeyCode::Enter => {
            let choice = options
                .get(view_data.dropdown_cursor)
                .cloned()
                .unwrap_or(FilterChoice::All);
            view_data.dropdown_cursor = 0;
            dispatch_view(
                state,
                runtime,
                view_data,
                tx,
                page,
                ViewCommand::SetFilter(facet, choice),
            );
            view_data.set_cursor(page, 0);
        }
        _ => {}
    }
}

fn cycle_model<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let page = state.active_page;
    if !page.view_config().requires_path_param {
        emit_status(state, view_data, tx, format!("{} is not listed per model", page.label()));
        return;
    }
    if view_data.models.is_empty() {
        emit_status(state, view_data, tx, "no models loaded yet -- press r to retry");
        return;
    }
    let next = view_data
        .view(page)
        .path_param()
        .and_then(|current| view_data.models.iter().position(|model| model == current))
        .map_or(0, |index| (index + 1) % view_data.models.len());
    let model = view_data.models[next].clone();
    view_data.set_cursor(page, 0);
    dispatch_view(
        state,
        runtime,
        view_data,
        tx,
        page,
        ViewCommand::SetPathParam(Some(model)),
    );
}

fn handle_detail_key<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let page = state.active_page;
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
            dispatch_view(state, runtime, view_data, tx, page, ViewCommand::CloseDetail);
        }
        KeyCode::Char('e') => {
            let record = view_data.view(page).selected().cloned();
            dispatch_view(state, runtime, view_data, tx, page, ViewCommand::CloseDetail);
            open_enquiry(state, view_data, tx, page, record.as_ref());
        }
        _ => {}
    }
}

fn open_enquiry(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    page: PageKind,
    record: Option<&ListingRecord>,
) {
    let Some(kind) = page.enquiry_form() else {
        emit_status(
            state,
            view_data,
            tx,
            format!("{} has no enquiry form -- press c to pick one", page.label()),
        );
        return;
    };
    open_form(state, view_data, kind, record);
}

fn open_form(
    state: &mut AppState,
    view_data: &mut ViewData,
    kind: LeadFormKind,
    record: Option<&ListingRecord>,
) {
    let mut form = LeadForm::new(kind);
    if let Some((key, value)) = record.and_then(ListingRecord::enquiry_prefill) {
        form.prefill(key, value);
    }
    view_data.form = Some(FormUiState::new(form));
    state.dispatch(AppCommand::OpenForm(kind));
}

fn handle_form_picker_key(state: &mut AppState, view_data: &mut ViewData, key: KeyEvent) {
    let Some(index) = view_data.form_picker else {
        return;
    };
    let count = LeadFormKind::ALL.len();
    match key.code {
        KeyCode::Esc => view_data.form_picker = None,
        KeyCode::Down | KeyCode::Char('j') => view_data.form_picker = Some((index + 1) % count),
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.form_picker = Some((index + count - 1) % count);
        }
        KeyCode::Enter => {
            view_data.form_picker = None;
            let kind = LeadFormKind::ALL[index];
            let page = state.active_page;
            let record = view_data.record_at_cursor(page).cloned();
            if state.mode == AppMode::Detail {
                view_data.view_mut(page).dispatch(ViewCommand::CloseDetail);
                state.dispatch(AppCommand::CloseDetail);
            }
            open_form(state, view_data, kind, record.as_ref());
            debug!(form = kind.label(), "form opened from picker");
        }
        _ => {}
    }
}

fn handle_form_key<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(form_ui) = view_data.form.as_mut() else {
        state.dispatch(AppCommand::CloseForm);
        return;
    };
    let field_count = form_ui.form.kind().fields().len();

    if key.code == KeyCode::Esc {
        if form_ui.in_flight.is_some() {
            emit_status(state, view_data, tx, "still sending -- wait for the reply");
            return;
        }
        view_data.form = None;
        state.dispatch(AppCommand::CloseForm);
        return;
    }

    let submit = key.code == KeyCode::Enter
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s'));
    if submit {
        submit_form(state, runtime, view_data, tx);
        return;
    }

    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            form_ui.field_index = (form_ui.field_index + 1) % field_count.max(1);
        }
        KeyCode::BackTab | KeyCode::Up => {
            form_ui.field_index =
                (form_ui.field_index + field_count.max(1) - 1) % field_count.max(1);
        }
        _ if form_ui.in_flight.is_some() => {}
        KeyCode::Left | KeyCode::Right => {
            let Some(spec) = form_ui.form.kind().fields().get(form_ui.field_index) else {
                return;
            };
            if let FieldFormat::Choice(options) = spec.format {
                let current = options
                    .iter()
                    .position(|option| *option == form_ui.form.value(spec.key));
                let next = match (current, key.code) {
                    (None, _) => 0,
                    (Some(index), KeyCode::Right) => (index + 1) % options.len(),
                    (Some(index), _) => (index + options.len() - 1) % options.len(),
                };
                form_ui.form.set_field(spec.key, options[next]);
            }
        }
        KeyCode::Backspace => {
            let Some(key) = form_ui.current_key() else {
                return;
            };
            let mut value = form_ui.form.value(key).to_owned();
            value.pop();
            form_ui.form.set_field(key, value);
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let Some(spec) = form_ui.form.kind().fields().get(form_ui.field_index) else {
                return;
            };
            if matches!(spec.format, FieldFormat::Choice(_)) {
                return;
            }
            let mut value = form_ui.form.value(spec.key).to_owned();
            value.push(ch);
            form_ui.form.set_field(spec.key, value);
        }
        _ => {}
    }
}

fn submit_form<R: PageRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(form_ui) = view_data.form.as_mut() else {
        return;
    };
    let submission = match form_ui.form.begin_submit() {
        Ok(submission) => submission,
        Err(error) => {
            let message = error.to_string();
            if let Some(index) = form_ui
                .form
                .kind()
                .fields()
                .iter()
                .position(|spec| form_ui.form.error(spec.key).is_some())
            {
                form_ui.field_index = index;
            }
            emit_status(state, view_data, tx, message);
            return;
        }
    };

    view_data.next_submit_id = view_data.next_submit_id.wrapping_add(1);
    let request_id = view_data.next_submit_id;
    form_ui.in_flight = Some(request_id);
    let label = submission.kind.label();
    debug!(form = label, request_id, "submitting lead");

    if let Err(error) = runtime.spawn_submit(request_id, submission, tx.clone()) {
        let message = view_data
            .form
            .as_mut()
            .map(|form_ui| {
                form_ui.in_flight = None;
                form_ui.form.finish_submit(Err(Some(error.to_string())))
            })
            .unwrap_or_default();
        emit_status(state, view_data, tx, message);
        return;
    }
    emit_status(state, view_data, tx, format!("sending {label}..."));
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let page = state.active_page;
    let view = view_data.view(page);
    let grouped = page.view_config().grouping.is_some();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(if grouped { 3 } else { 0 }),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = PageKind::ALL
        .iter()
        .position(|candidate| *candidate == page)
        .unwrap_or(0);
    let tabs = Tabs::new(PageKind::ALL.iter().map(|page| page.label()).collect::<Vec<_>>())
        .block(Block::default().title("showroom").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    let filters = Paragraph::new(filter_bar_text(page, view))
        .block(Block::default().title("filters").borders(Borders::ALL));
    frame.render_widget(filters, layout[1]);

    if grouped {
        let (titles, active) = group_tabs(view);
        let groups = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .select(active);
        frame.render_widget(groups, layout[2]);
    }

    if let Some(body) = placeholder_text(page, view, view_data.models.is_empty()) {
        let placeholder = Paragraph::new(body)
            .block(Block::default().title(page.label()).borders(Borders::ALL));
        frame.render_widget(placeholder, layout[3]);
    } else if page.view_config().accordion {
        let body = Paragraph::new(accordion_text(view, view_data.cursor(page)))
            .block(Block::default().title(page.label()).borders(Borders::ALL));
        frame.render_widget(body, layout[3]);
    } else {
        render_table(frame, layout[3], page, view_data);
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[4]);

    if let Some(facet) = view.dropdown() {
        let area = centered_rect(40, 50, frame.area());
        frame.render_widget(Clear, area);
        let dropdown = Paragraph::new(dropdown_text(view, facet, view_data.dropdown_cursor))
            .block(Block::default().title(facet.label()).borders(Borders::ALL));
        frame.render_widget(dropdown, area);
    }

    if state.mode == AppMode::Detail
        && let Some(record) = view.selected()
    {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let detail = Paragraph::new(detail_text(
            record,
            &view_data.currency,
            &view_data.detail_media,
        ))
        .block(
            Block::default()
                .title(record.title().to_owned())
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(detail, area);
    }

    if let Some(form_ui) = &view_data.form {
        let area = centered_rect(64, 70, frame.area());
        frame.render_widget(Clear, area);
        let form = Paragraph::new(form_text(form_ui)).block(
            Block::default()
                .title(form_ui.form.kind().label())
                .borders(Borders::ALL),
        );
        frame.render_widget(form, area);
    }

    if let Some(index) = view_data.form_picker {
        let area = centered_rect(40, 45, frame.area());
        frame.render_widget(Clear, area);
        let picker = Paragraph::new(form_picker_text(index))
            .block(Block::default().title("forms").borders(Borders::ALL));
        frame.render_widget(picker, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, page: PageKind, view_data: &ViewData) {
    let view = view_data.view(page);
    let columns = page.columns();
    let widths = vec![Constraint::Min(8); columns.len().max(1)];
    let header = Row::new(columns.iter().map(|column| {
        Cell::from(*column).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let cursor = view_data.cursor(page);
    let rows = view.rows().into_iter().enumerate().map(|(index, record)| {
        let style = if index == cursor {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(
            record
                .cells(&view_data.currency)
                .into_iter()
                .map(Cell::from)
                .collect::<Vec<_>>(),
        )
        .style(style)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(page, view))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn table_title(page: PageKind, view: &CollectionView<ListingRecord>) -> String {
    let shown = view.rows().len();
    let total = view.items().len();
    let mut title = if shown == total {
        format!("{} ({total})", page.label())
    } else {
        format!("{} ({shown}/{total})", page.label())
    };
    if let Some(model) = view.path_param() {
        title.push_str(" - ");
        title.push_str(model);
    }
    title
}

/// Text shown in place of the table while a page has nothing to list.
fn placeholder_text(
    page: PageKind,
    view: &CollectionView<ListingRecord>,
    models_missing: bool,
) -> Option<String> {
    match view.load_state() {
        LoadState::Idle if !view.can_fetch() && models_missing => {
            Some("waiting for the model list".to_owned())
        }
        LoadState::Idle if !view.can_fetch() => Some("press m to choose a model".to_owned()),
        LoadState::Idle | LoadState::Loading => Some("loading...".to_owned()),
        LoadState::NotFound(message) => Some(format!("nothing to show: {message}")),
        LoadState::Failed(message) => Some(format!("load failed: {message}\n\npress r to retry")),
        LoadState::Loaded if view.rows().is_empty() && !view.items().is_empty() => Some(format!(
            "no {} match the current filters -- press x to reset",
            page.label()
        )),
        LoadState::Loaded if view.items().is_empty() => {
            Some(format!("no {} published yet", page.label()))
        }
        LoadState::Loaded => None,
    }
}

fn filter_bar_text(page: PageKind, view: &CollectionView<ListingRecord>) -> String {
    let config = page.view_config();
    let mut parts = config
        .filters
        .iter()
        .map(|facet| format!("{}: {}", facet.label(), view.filters().choice(*facet).label(*facet)))
        .collect::<Vec<_>>();
    if config.requires_path_param {
        parts.insert(
            0,
            format!("model: {} (m)", view.path_param().unwrap_or("none")),
        );
    }
    if parts.is_empty() {
        return "no filters".to_owned();
    }
    parts.join(" | ")
}

fn group_tabs(view: &CollectionView<ListingRecord>) -> (Vec<String>, usize) {
    let titles = view
        .groups()
        .into_iter()
        .map(|group| format!("{} ({})", group.key, group.items.len()))
        .collect::<Vec<_>>();
    let active = view
        .active_group()
        .and_then(|active| view.groups().iter().position(|group| group.key == active))
        .unwrap_or(0);
    (titles, active)
}

fn accordion_text(view: &CollectionView<ListingRecord>, cursor: usize) -> String {
    let mut lines = Vec::new();
    for (index, record) in view.rows().into_iter().enumerate() {
        let expanded = view.accordion() == Some(index);
        let marker = if expanded { "v" } else { ">" };
        let pointer = if index == cursor { "*" } else { " " };
        lines.push(format!("{pointer} {marker} {}", record.title()));
        if expanded {
            for (label, value) in record.detail_lines("") {
                if label == "answer" {
                    lines.push(format!("      {value}"));
                }
            }
        }
    }
    lines.join("\n")
}

fn dropdown_text(
    view: &CollectionView<ListingRecord>,
    facet: Facet,
    cursor: usize,
) -> String {
    let current = view.filters().choice(facet);
    view.filter_options(facet)
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let pointer = if index == cursor { ">" } else { " " };
            let mark = if *option == current { "*" } else { " " };
            format!("{pointer}{mark} {}", option.label(facet))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn detail_text(record: &ListingRecord, currency: &str, media: &[String]) -> String {
    let mut lines = record
        .detail_lines(currency)
        .into_iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect::<Vec<_>>();
    if !media.is_empty() {
        lines.push(String::new());
        lines.push("media:".to_owned());
        lines.extend(media.iter().map(|url| format!("  {url}")));
    }
    lines.push(String::new());
    if record.page().enquiry_form().is_some() {
        lines.push("e enquire | esc close".to_owned());
    } else {
        lines.push("esc close".to_owned());
    }
    lines.join("\n")
}

fn form_text(form_ui: &FormUiState) -> String {
    let form = &form_ui.form;
    let mut lines = Vec::new();
    for (index, spec) in form.kind().fields().iter().enumerate() {
        let pointer = if index == form_ui.field_index { ">" } else { " " };
        let required = if spec.required { "*" } else { "" };
        let mut line = format!("{pointer} {}{required}: {}", spec.label, form.value(spec.key));
        if let FieldFormat::Choice(_) = spec.format
            && index == form_ui.field_index
        {
            line.push_str("  (left/right)");
        }
        if let Some(error) = form.error(spec.key) {
            line.push_str(&format!("  [{error}]"));
        }
        lines.push(line);
    }
    lines.push(String::new());
    lines.push(match form.state() {
        SubmitState::Editing => "enter send | tab next field | esc close".to_owned(),
        SubmitState::Submitting => "sending...".to_owned(),
        SubmitState::Succeeded(message) => format!("sent: {message}"),
        SubmitState::Failed(message) => format!("not sent: {message}"),
    });
    lines.join("\n")
}

fn form_picker_text(cursor: usize) -> String {
    LeadFormKind::ALL
        .iter()
        .enumerate()
        .map(|(index, kind)| {
            let pointer = if index == cursor { ">" } else { " " };
            format!("{pointer} {}", kind.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let mode = match state.mode {
        AppMode::Browse => "BROWSE",
        AppMode::Detail => "DETAIL",
        AppMode::Form(_) => "FORM",
    };
    let hints = match state.mode {
        AppMode::Browse if view_data.view(state.active_page).dropdown().is_some() => {
            "j/k move | enter apply | f next filter | esc close"
        }
        AppMode::Browse => "tab page | enter open | f filter | e enquire | c forms | ? help",
        AppMode::Detail => "e enquire | esc close",
        AppMode::Form(_) => "enter send | tab next | esc close",
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "pages: tab/shift-tab or 1-9,0\n\
rows: j/k move | enter open detail or expand answer\n\
groups: [ ] switch tab\n\
filters: f open dropdown | x reset all\n\
models: m next model (specs, highlights)\n\
forms: e enquire about row | c pick any form\n\
form: tab/shift-tab field | left/right choice | enter send | esc close\n\
r reload | ? help | q quit"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        FormUiState, InternalEvent, PageRuntime, ViewData, filter_bar_text, form_text,
        handle_key_event, placeholder_text, process_internal_events, status_text,
    };
    use anyhow::{Result, bail};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use showroom_app::{
        AppMode, AppState, Facet, FetchOutcome, FetchTicket, FilterChoice, LeadForm, LeadFormKind,
        LeadSubmission, ListingItem, ListingRecord, PageKind, SubmitState, ViewCommand,
    };
    use showroom_testkit::CatalogFaker;
    use std::collections::BTreeMap;
    use std::sync::mpsc::{self, Receiver, Sender};

    #[derive(Default)]
    struct TestRuntime {
        pages: BTreeMap<PageKind, Vec<ListingRecord>>,
        models: Vec<String>,
        models_fail: bool,
        categories: Vec<String>,
        loads: Vec<(PageKind, FetchTicket)>,
        submissions: Vec<LeadSubmission>,
        submit_reply: Option<std::result::Result<Option<String>, Option<String>>>,
    }

    impl PageRuntime for TestRuntime {
        fn load_page(
            &mut self,
            page: PageKind,
            ticket: &FetchTicket,
        ) -> FetchOutcome<ListingRecord> {
            self.loads.push((page, ticket.clone()));
            let Some(records) = self.pages.get(&page) else {
                return FetchOutcome::NotFound(format!("no {}", page.label()));
            };
            let wanted = |facet: Facet| {
                ticket
                    .query
                    .iter()
                    .find(|(key, _)| key == facet.query_key())
                    .map(|(_, value)| value.as_str())
            };
            FetchOutcome::Found(
                records
                    .iter()
                    .filter(|record| {
                        [Facet::Category, Facet::Model].iter().all(|facet| {
                            wanted(*facet).is_none_or(|value| record.facet(*facet) == Some(value))
                        })
                    })
                    .cloned()
                    .collect(),
            )
        }

        fn list_models(&mut self) -> Result<Vec<String>> {
            if self.models_fail {
                bail!("models endpoint down");
            }
            Ok(self.models.clone())
        }

        fn list_categories(&mut self) -> Result<Vec<String>> {
            Ok(self.categories.clone())
        }

        fn submit_lead(
            &mut self,
            submission: &LeadSubmission,
        ) -> std::result::Result<Option<String>, Option<String>> {
            self.submissions.push(submission.clone());
            self.submit_reply.clone().unwrap_or(Ok(None))
        }

        fn resolve_media(&self, reference: &str) -> Option<String> {
            Some(format!("https://cdn.test/{reference}"))
        }
    }

    fn runtime_with_catalog() -> TestRuntime {
        let mut faker = CatalogFaker::new(7);
        let vehicles = (0..4)
            .map(|_| ListingRecord::Vehicle(faker.vehicle()))
            .collect();
        let faqs = (0..3)
            .map(|_| ListingRecord::Faq(faker.faq()))
            .collect();
        let specs = faker
            .specifications("Aurora", 2)
            .into_iter()
            .map(ListingRecord::Specification)
            .collect();
        let mut pages = BTreeMap::new();
        pages.insert(PageKind::Vehicles, vehicles);
        pages.insert(PageKind::Faqs, faqs);
        pages.insert(PageKind::Specifications, specs);
        TestRuntime {
            pages,
            models: vec!["Aurora".to_owned(), "Breeze".to_owned()],
            ..TestRuntime::default()
        }
    }

    fn internal_channel() -> (Sender<InternalEvent>, Receiver<InternalEvent>) {
        mpsc::channel()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn pump(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        rx: &Receiver<InternalEvent>,
    ) {
        process_internal_events(state, runtime, view_data, tx, rx);
    }

    fn run_key_script(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        rx: &Receiver<InternalEvent>,
        keys: &[KeyEvent],
    ) -> bool {
        for key in keys {
            if handle_key_event(state, runtime, view_data, tx, *key) {
                return true;
            }
            pump(state, runtime, view_data, tx, rx);
        }
        false
    }

    fn started(
        runtime: &mut TestRuntime,
        page: PageKind,
    ) -> (AppState, ViewData, Sender<InternalEvent>, Receiver<InternalEvent>) {
        started_with(runtime, page, None)
    }

    fn started_with(
        runtime: &mut TestRuntime,
        page: PageKind,
        start_model: Option<&str>,
    ) -> (AppState, ViewData, Sender<InternalEvent>, Receiver<InternalEvent>) {
        let mut state = AppState::new(page);
        let mut view_data = ViewData::new("$");
        let (tx, rx) = internal_channel();
        super::request_models(&mut state, runtime, &mut view_data, &tx);
        super::request_categories(runtime, &tx);
        super::open_start_page(
            &mut state,
            runtime,
            &mut view_data,
            &tx,
            start_model.map(str::to_owned),
        );
        pump(&mut state, runtime, &mut view_data, &tx, &rx);
        (state, view_data, tx, rx)
    }

    fn keys(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        rx: &Receiver<InternalEvent>,
        codes: &[KeyCode],
    ) {
        let events = codes.iter().map(|code| key(*code)).collect::<Vec<_>>();
        run_key_script(state, runtime, view_data, tx, rx, &events);
    }

    #[test]
    fn first_visit_loads_each_page_once() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Vehicles);
        assert_eq!(view_data.view(PageKind::Vehicles).items().len(), 4);

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Tab), key(KeyCode::BackTab), key(KeyCode::Tab)],
        );
        assert_eq!(state.active_page, PageKind::Accessories);
        let vehicle_loads = runtime
            .loads
            .iter()
            .filter(|(page, _)| *page == PageKind::Vehicles)
            .count();
        assert_eq!(vehicle_loads, 1);
        assert_eq!(
            view_data.view(PageKind::Accessories).message(),
            Some("no accessories")
        );
        assert_eq!(state.status_line.as_deref(), Some("accessories: no accessories"));
    }

    #[test]
    fn enter_opens_detail_with_resolved_media_and_esc_closes() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Vehicles);

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('j')), key(KeyCode::Enter)],
        );
        assert_eq!(state.mode, AppMode::Detail);
        let expected = view_data.view(PageKind::Vehicles).rows()[1].key().to_owned();
        assert_eq!(
            view_data.view(PageKind::Vehicles).selected_key(),
            Some(expected.as_str())
        );
        assert!(
            view_data
                .detail_media
                .iter()
                .all(|url| url.starts_with("https://cdn.test/"))
        );

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Esc)],
        );
        assert_eq!(state.mode, AppMode::Browse);
        assert!(!view_data.view(PageKind::Vehicles).detail_open());
        assert!(view_data.detail_media.is_empty());
    }

    #[test]
    fn dropdown_applies_local_filter() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Vehicles);
        let first_model = view_data.view(PageKind::Vehicles).items()[0]
            .facet(Facet::Model)
            .map(str::to_owned);

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[
                key(KeyCode::Char('f')),
                key(KeyCode::Char('j')),
                key(KeyCode::Enter),
            ],
        );

        let view = view_data.view(PageKind::Vehicles);
        assert_eq!(view.dropdown(), None);
        assert_eq!(
            view.filters().value(Facet::Model).map(str::to_owned),
            first_model
        );
        assert!(
            view.rows()
                .iter()
                .all(|record| record.facet(Facet::Model) == first_model.as_deref())
        );
        assert_eq!(runtime.loads.len(), 1, "local filters never refetch");

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('x'))],
        );
        assert!(view_data.view(PageKind::Vehicles).filters().is_unconstrained());
    }

    #[test]
    fn accordion_page_expands_one_answer_at_a_time() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Faqs);

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Enter)],
        );
        assert_eq!(view_data.view(PageKind::Faqs).accordion(), Some(0));
        assert_eq!(state.mode, AppMode::Browse);

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Enter)],
        );
        assert_eq!(view_data.view(PageKind::Faqs).accordion(), None);
    }

    #[test]
    fn model_list_unlocks_model_keyed_pages() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Specifications);

        let view = view_data.view(PageKind::Specifications);
        assert_eq!(view.path_param(), Some("Aurora"));
        assert_eq!(view.items().len(), runtime.pages[&PageKind::Specifications].len());
        let (_, ticket) = runtime
            .loads
            .last()
            .expect("specifications should have loaded");
        assert_eq!(ticket.path_param.as_deref(), Some("Aurora"));

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('m'))],
        );
        assert_eq!(
            view_data.view(PageKind::Specifications).path_param(),
            Some("Breeze")
        );
        let (page, ticket) = runtime.loads.last().expect("model change refetches");
        assert_eq!(*page, PageKind::Specifications);
        assert_eq!(ticket.path_param.as_deref(), Some("Breeze"));
    }

    #[test]
    fn failed_model_list_keeps_page_waiting() {
        let mut runtime = TestRuntime {
            models_fail: true,
            ..TestRuntime::default()
        };
        let (state, view_data, _tx, _rx) = started(&mut runtime, PageKind::Highlights);

        assert!(runtime.loads.is_empty());
        assert_eq!(
            state.status_line.as_deref(),
            Some("model list unavailable: models endpoint down")
        );
        assert_eq!(
            placeholder_text(
                PageKind::Highlights,
                view_data.view(PageKind::Highlights),
                true
            )
            .as_deref(),
            Some("waiting for the model list")
        );
    }

    #[test]
    fn stale_fetch_result_is_ignored() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Vehicles);
        let before = view_data.view(PageKind::Vehicles).items().to_vec();

        tx.send(InternalEvent::Fetched {
            page: PageKind::Vehicles,
            request_id: 0,
            outcome: FetchOutcome::Found(Vec::new()),
        })
        .expect("channel open");
        pump(&mut state, &mut runtime, &mut view_data, &tx, &rx);

        assert_eq!(view_data.view(PageKind::Vehicles).items(), before.as_slice());
    }

    #[test]
    fn enquiry_from_detail_prefills_model_and_submits() {
        let mut runtime = runtime_with_catalog();
        runtime.submit_reply = Some(Ok(Some("loan desk will call you".to_owned())));
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Vehicles);
        let model = view_data.view(PageKind::Vehicles).rows()[0]
            .enquiry_prefill()
            .map(|(_, value)| value.to_owned())
            .expect("vehicles carry a model");

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Enter), key(KeyCode::Char('e'))],
        );
        assert_eq!(state.mode, AppMode::Form(LeadFormKind::LoanEnquiry));
        assert!(!view_data.view(PageKind::Vehicles).detail_open());

        let form_ui = view_data.form.as_mut().expect("form should be open");
        assert_eq!(form_ui.form.value("model"), model);
        form_ui.form.set_field("email", "asha@example.com");
        form_ui.form.set_field("phone", "9876543210");
        form_ui.form.set_field("tenure", "36 months");

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[
                key(KeyCode::Char('A')),
                key(KeyCode::Char('s')),
                key(KeyCode::Backspace),
                key(KeyCode::Char('a')),
                key(KeyCode::Enter),
            ],
        );

        assert_eq!(runtime.submissions.len(), 1);
        assert_eq!(runtime.submissions[0].fields["name"], "Aa");
        assert_eq!(runtime.submissions[0].fields["model"], model);
        let form_ui = view_data.form.as_ref().expect("form stays open");
        assert_eq!(
            form_ui.form.state(),
            &SubmitState::Succeeded("loan desk will call you".to_owned())
        );
        assert_eq!(form_ui.form.value("name"), "");
        assert_eq!(
            state.status_line.as_deref(),
            Some("loan desk will call you")
        );

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Esc)],
        );
        assert_eq!(state.mode, AppMode::Browse);
        assert!(view_data.form.is_none());
    }

    #[test]
    fn invalid_form_is_not_sent() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Vehicles);

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[
                key(KeyCode::Char('c')),
                key(KeyCode::Enter),
                key(KeyCode::Tab),
                key(KeyCode::Enter),
            ],
        );

        assert_eq!(state.mode, AppMode::Form(LeadFormKind::Contact));
        assert!(runtime.submissions.is_empty());
        let form_ui = view_data.form.as_ref().expect("form should be open");
        assert_eq!(form_ui.field_index, 0, "cursor jumps to first invalid field");
        assert!(form_ui.form.error("name").is_some());
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("fix the highlighted fields"))
        );
    }

    #[test]
    fn failed_submission_keeps_values_for_retry() {
        let mut runtime = runtime_with_catalog();
        runtime.submit_reply = Some(Err(None));
        let mut state = AppState::default();
        let mut view_data = ViewData::new("$");
        let (tx, rx) = internal_channel();

        let mut form = LeadForm::new(LeadFormKind::Contact);
        form.set_field("name", "Tara");
        form.set_field("email", "tara@example.com");
        form.set_field("phone", "9876543210");
        view_data.form = Some(FormUiState::new(form));
        state.dispatch(showroom_app::AppCommand::OpenForm(LeadFormKind::Contact));

        run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Enter)],
        );

        let form_ui = view_data.form.as_ref().expect("form stays open");
        assert_eq!(form_ui.form.value("name"), "Tara");
        assert!(matches!(form_ui.form.state(), SubmitState::Failed(_)));
        assert!(form_text(form_ui).contains("not sent: something went wrong"));
    }

    #[test]
    fn status_clear_ignores_superseded_tokens() {
        let mut runtime = TestRuntime::default();
        let mut state = AppState::default();
        let mut view_data = ViewData::new("$");
        let (tx, rx) = internal_channel();

        super::emit_status(&mut state, &mut view_data, &tx, "first");
        super::emit_status(&mut state, &mut view_data, &tx, "second");
        tx.send(InternalEvent::ClearStatus { token: 1 })
            .expect("channel open");
        pump(&mut state, &mut runtime, &mut view_data, &tx, &rx);
        assert_eq!(state.status_line.as_deref(), Some("second"));

        tx.send(InternalEvent::ClearStatus { token: 2 })
            .expect("channel open");
        pump(&mut state, &mut runtime, &mut view_data, &tx, &rx);
        assert_eq!(state.status_line, None);
    }

    #[test]
    fn filter_bar_and_status_text() {
        let view_data = ViewData::new("$");
        assert_eq!(
            filter_bar_text(PageKind::Vehicles, view_data.view(PageKind::Vehicles)),
            "model: All Models | category: All Categories | fuel: All Fuel Types | transmission: All Transmissions"
        );
        assert_eq!(
            filter_bar_text(PageKind::Testimonials, view_data.view(PageKind::Testimonials)),
            "no filters"
        );
        assert_eq!(
            filter_bar_text(PageKind::Highlights, view_data.view(PageKind::Highlights)),
            "model: none (m)"
        );

        let state = AppState::default();
        assert!(status_text(&state, &view_data).starts_with("BROWSE | tab page"));
    }

    #[test]
    fn q_quits_from_browse_only() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Vehicles);
        assert!(!run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('?')), key(KeyCode::Char('q'))],
        ));
        assert!(!view_data.help_visible);
        assert!(run_key_script(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('q'))],
        ));
    }

    #[test]
    fn rows_from_a_failed_reload_cannot_be_opened() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Vehicles);
        assert_eq!(view_data.view(PageKind::Vehicles).rows().len(), 4);

        runtime.pages.remove(&PageKind::Vehicles);
        keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[KeyCode::Char('j'), KeyCode::Char('r'), KeyCode::Enter],
        );

        let view = view_data.view(PageKind::Vehicles);
        assert!(view.items().is_empty());
        assert_eq!(
            placeholder_text(PageKind::Vehicles, view, false).as_deref(),
            Some("nothing to show: no vehicles")
        );
        assert_eq!(state.mode, AppMode::Browse);
        assert!(view.selected().is_none());
        assert_eq!(view_data.cursor(PageKind::Vehicles), 0);

        keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[KeyCode::Char('e')],
        );
        assert_eq!(state.mode, AppMode::Form(LeadFormKind::LoanEnquiry));
        let form_ui = view_data.form.as_ref().expect("form should be open");
        assert_eq!(form_ui.form.value("model"), "");
    }

    #[test]
    fn switching_model_never_prefills_the_previous_model() {
        let mut runtime = runtime_with_catalog();
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Specifications);
        assert!(!view_data.view(PageKind::Specifications).rows().is_empty());

        runtime.pages.remove(&PageKind::Specifications);
        keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[KeyCode::Char('m'), KeyCode::Char('e')],
        );

        let view = view_data.view(PageKind::Specifications);
        assert_eq!(view.path_param(), Some("Breeze"));
        assert!(view.rows().is_empty());
        assert_eq!(state.mode, AppMode::Form(LeadFormKind::ServiceBooking));
        let form_ui = view_data.form.as_ref().expect("form should be open");
        assert_eq!(form_ui.form.value("model"), "");
    }

    #[test]
    fn category_dropdown_keeps_every_published_category() {
        let mut faker = CatalogFaker::new(12);
        let accessories = (0..12)
            .map(|_| ListingRecord::Accessory(faker.accessory()))
            .collect::<Vec<_>>();
        let categories = vec![
            "Interior".to_owned(),
            "Exterior".to_owned(),
            "Electronics".to_owned(),
            "Safety".to_owned(),
            "Care".to_owned(),
        ];
        let mut runtime = TestRuntime {
            pages: BTreeMap::from([(PageKind::Accessories, accessories)]),
            categories: categories.clone(),
            ..TestRuntime::default()
        };
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Accessories);

        keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[
                KeyCode::Char('f'),
                KeyCode::Char('j'),
                KeyCode::Char('j'),
                KeyCode::Enter,
            ],
        );
        let (_, ticket) = runtime.loads.last().expect("category change refetches");
        assert_eq!(
            ticket.query,
            vec![("category".to_owned(), "Exterior".to_owned())]
        );

        let view = view_data.view(PageKind::Accessories);
        assert!(
            view.rows()
                .iter()
                .all(|record| record.facet(Facet::Category) == Some("Exterior"))
        );
        let mut expected = vec![FilterChoice::All];
        expected.extend(categories.into_iter().map(FilterChoice::Value));
        assert_eq!(view.filter_options(Facet::Category), expected);
    }

    #[test]
    fn gallery_groups_by_category_and_filters_models_on_the_server() {
        let mut faker = CatalogFaker::new(14);
        let images = (0..9)
            .map(|_| faker.gallery_image())
            .collect::<Vec<_>>();
        let mut first_seen = Vec::new();
        for image in &images {
            if !first_seen.contains(&image.category) {
                first_seen.push(image.category.clone());
            }
        }
        let models = showroom_testkit::models()
            .iter()
            .map(|model| (*model).to_owned())
            .collect::<Vec<_>>();
        let mut runtime = TestRuntime {
            pages: BTreeMap::from([(
                PageKind::Gallery,
                images.into_iter().map(ListingRecord::GalleryImage).collect(),
            )]),
            models: models.clone(),
            ..TestRuntime::default()
        };
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Gallery);

        let view = view_data.view(PageKind::Gallery);
        let groups = view
            .groups()
            .into_iter()
            .map(|group| group.key)
            .collect::<Vec<_>>();
        assert_eq!(groups, first_seen);
        assert_eq!(view.active_group(), first_seen.first().map(String::as_str));

        if first_seen.len() > 1 {
            keys(
                &mut state,
                &mut runtime,
                &mut view_data,
                &tx,
                &rx,
                &[KeyCode::Char(']')],
            );
            assert_eq!(
                view_data.view(PageKind::Gallery).active_group(),
                Some(first_seen[1].as_str())
            );
        }

        keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[KeyCode::Char('f'), KeyCode::Char('j'), KeyCode::Enter],
        );
        let (page, ticket) = runtime.loads.last().expect("model change refetches");
        assert_eq!(*page, PageKind::Gallery);
        assert_eq!(ticket.query, vec![("model".to_owned(), models[0].clone())]);
        assert_eq!(
            view_data
                .view(PageKind::Gallery)
                .filter_options(Facet::Model)
                .len(),
            models.len() + 1
        );
    }

    #[test]
    fn locations_group_by_city_alphabetically_and_filter_kind_loosely() {
        let mut faker = CatalogFaker::new(16);
        let locations = (0..10).map(|_| faker.location()).collect::<Vec<_>>();
        let kind = locations[0].kind.clone();
        let mut runtime = TestRuntime {
            pages: BTreeMap::from([(
                PageKind::Locations,
                locations.into_iter().map(ListingRecord::Location).collect(),
            )]),
            ..TestRuntime::default()
        };
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Locations);

        let cities = view_data
            .view(PageKind::Locations)
            .groups()
            .into_iter()
            .map(|group| group.key)
            .collect::<Vec<_>>();
        let mut sorted = cities.clone();
        sorted.sort_by_key(|city| city.to_ascii_lowercase());
        assert_eq!(cities, sorted);
        assert_eq!(
            view_data.view(PageKind::Locations).active_group(),
            cities.first().map(String::as_str)
        );

        super::dispatch_view(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            PageKind::Locations,
            ViewCommand::SetFilter(Facet::Kind, FilterChoice::Value(kind.to_uppercase())),
        );
        let view = view_data.view(PageKind::Locations);
        assert!(!view.visible().is_empty());
        assert!(view.visible().iter().all(|record| {
            record
                .facet(Facet::Kind)
                .is_some_and(|value| value.eq_ignore_ascii_case(&kind))
        }));
        assert_eq!(runtime.loads.len(), 1, "kind filter stays local");
    }

    #[test]
    fn highlights_switch_tabs_for_the_chosen_model() {
        let mut faker = CatalogFaker::new(18);
        let highlights = faker
            .highlights("Aurora")
            .into_iter()
            .map(ListingRecord::Highlight)
            .collect();
        let mut runtime = TestRuntime {
            pages: BTreeMap::from([(PageKind::Highlights, highlights)]),
            models: vec!["Aurora".to_owned(), "Breeze".to_owned()],
            ..TestRuntime::default()
        };
        let (mut state, mut view_data, tx, rx) = started(&mut runtime, PageKind::Highlights);

        let view = view_data.view(PageKind::Highlights);
        let tabs = view
            .groups()
            .into_iter()
            .map(|group| group.key)
            .collect::<Vec<_>>();
        assert_eq!(tabs, vec!["Exterior", "Interior", "Performance", "Safety"]);
        assert_eq!(view.active_group(), Some("Exterior"));
        assert_eq!(view.rows().len(), 1);

        keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[KeyCode::Char(']'), KeyCode::Char(']')],
        );
        assert_eq!(
            view_data.view(PageKind::Highlights).active_group(),
            Some("Performance")
        );
        keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &rx,
            &[KeyCode::Char('[')],
        );
        assert_eq!(
            view_data.view(PageKind::Highlights).active_group(),
            Some("Interior")
        );
    }

    #[test]
    fn start_model_wins_over_first_listed_model() {
        let mut runtime = runtime_with_catalog();
        let (_state, view_data, _tx, _rx) =
            started_with(&mut runtime, PageKind::Specifications, Some("Breeze"));

        assert_eq!(
            view_data.view(PageKind::Specifications).path_param(),
            Some("Breeze")
        );
        assert_eq!(runtime.loads.len(), 1);
        assert_eq!(runtime.loads[0].1.path_param.as_deref(), Some("Breeze"));

        let mut runtime = runtime_with_catalog();
        let (_state, view_data, _tx, _rx) =
            started_with(&mut runtime, PageKind::Vehicles, Some("Breeze"));
        assert_eq!(view_data.view(PageKind::Vehicles).path_param(), None);
        assert_eq!(view_data.view(PageKind::Vehicles).items().len(), 4);
    }
}
