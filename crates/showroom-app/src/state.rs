// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{LeadFormKind, PageKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Browse,
    Detail,
    Form(LeadFormKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_page: PageKind,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Browse,
            active_page: PageKind::Vehicles,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextPage,
    PrevPage,
    GoToPage(PageKind),
    OpenDetail,
    CloseDetail,
    OpenForm(LeadFormKind),
    CloseForm,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    PageChanged(PageKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn new(start_page: PageKind) -> Self {
        Self {
            active_page: start_page,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextPage => self.rotate_page(1),
            AppCommand::PrevPage => self.rotate_page(-1),
            AppCommand::GoToPage(page) => {
                if page == self.active_page {
                    return Vec::new();
                }
                self.active_page = page;
                let mut events = vec![AppEvent::PageChanged(page)];
                events.extend(self.set_mode(AppMode::Browse));
                events
            }
            AppCommand::OpenDetail => self.set_mode(AppMode::Detail).into_iter().collect(),
            AppCommand::CloseDetail => {
                if self.mode != AppMode::Detail {
                    return Vec::new();
                }
                self.set_mode(AppMode::Browse).into_iter().collect()
            }
            AppCommand::OpenForm(kind) => {
                let mut events: Vec<AppEvent> =
                    self.set_mode(AppMode::Form(kind)).into_iter().collect();
                events.push(self.set_status(kind.label()));
                events
            }
            AppCommand::CloseForm => {
                if !matches!(self.mode, AppMode::Form(_)) {
                    return Vec::new();
                }
                self.set_mode(AppMode::Browse).into_iter().collect()
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_page(&mut self, delta: isize) -> Vec<AppEvent> {
        let pages = PageKind::ALL;
        let current = pages
            .iter()
            .position(|page| *page == self.active_page)
            .unwrap_or(0) as isize;
        let len = pages.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_page = pages[next];
        let mut events = vec![AppEvent::PageChanged(self.active_page)];
        events.extend(self.set_mode(AppMode::Browse));
        events
    }

    fn set_mode(&mut self, mode: AppMode) -> Option<AppEvent> {
        if self.mode == mode {
            return None;
        }
        self.mode = mode;
        Some(AppEvent::ModeChanged(mode))
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
