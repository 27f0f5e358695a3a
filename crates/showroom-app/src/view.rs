// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::filter::{FilterChoice, FilterSelection, facet_options, filter_items, listed_options};
use crate::group::{Group, Grouping, group_items};
use crate::model::{Facet, ListingItem};

/// Static shape of a page: which facets it filters on, which of those the
/// server applies, and how it groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    pub filters: &'static [Facet],
    pub remote_filters: &'static [Facet],
    pub grouping: Option<Grouping>,
    pub accordion: bool,
    pub requires_path_param: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    NotFound(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub request_id: u64,
    pub query: Vec<(String, String)>,
    pub path_param: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Found(Vec<T>),
    NotFound(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Select(String),
    CloseDetail,
    ToggleAccordion(usize),
    SelectGroup(String),
    SetFilter(Facet, FilterChoice),
    ResetFilters,
    ToggleDropdown(Facet),
    SetPathParam(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    SelectionChanged(Option<String>),
    DetailOpened(String),
    DetailClosed,
    AccordionChanged(Option<usize>),
    GroupChanged(Option<String>),
    FilterChanged(Facet),
    DropdownChanged(Option<Facet>),
    RefetchNeeded,
    CollectionReplaced(usize),
    NotFound(String),
    LoadFailed(String),
    StaleResponseDropped(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionView<T> {
    config: ViewConfig,
    items: Vec<T>,
    filters: FilterSelection,
    load: LoadState,
    selected: Option<String>,
    detail_open: bool,
    accordion: Option<usize>,
    active_group: Option<String>,
    dropdown: Option<Facet>,
    path_param: Option<String>,
    published: BTreeMap<Facet, Vec<String>>,
    latest_request: u64,
}

impl<T: ListingItem> CollectionView<T> {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            items: Vec::new(),
            filters: FilterSelection::default(),
            load: LoadState::Idle,
            selected: None,
            detail_open: false,
            accordion: None,
            active_group: None,
            dropdown: None,
            path_param: None,
            published: BTreeMap::new(),
            latest_request: 0,
        }
    }

    pub fn config(&self) -> ViewConfig {
        self.config
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn is_loading(&self) -> bool {
        self.load == LoadState::Loading
    }

    pub fn has_loaded(&self) -> bool {
        self.load != LoadState::Idle
    }

    pub fn message(&self) -> Option<&str> {
        match &self.load {
            LoadState::NotFound(message) | LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn path_param(&self) -> Option<&str> {
        self.path_param.as_deref()
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&T> {
        let key = self.selected.as_deref()?;
        self.items.iter().find(|item| item.key() == key)
    }

    pub fn detail_open(&self) -> bool {
        self.detail_open
    }

    pub fn accordion(&self) -> Option<usize> {
        self.accordion
    }

    pub fn active_group(&self) -> Option<&str> {
        self.active_group.as_deref()
    }

    pub fn dropdown(&self) -> Option<Facet> {
        self.dropdown
    }

    /// Whether a fetch can be issued; pages keyed by a path parameter wait
    /// until one is set.
    pub fn can_fetch(&self) -> bool {
        !self.config.requires_path_param || self.path_param.is_some()
    }

    /// Starts a fetch. Only the response carrying the returned request id
    /// will be applied; anything older is dropped on arrival.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_request = self.latest_request.wrapping_add(1);
        self.load = LoadState::Loading;
        FetchTicket {
            request_id: self.latest_request,
            query: self.filters.query_params(self.config.remote_filters),
            path_param: self.path_param.clone(),
        }
    }

    pub fn apply_response(&mut self, request_id: u64, outcome: FetchOutcome<T>) -> Vec<ViewEvent> {
        if request_id != self.latest_request {
            return vec![ViewEvent::StaleResponseDropped(request_id)];
        }

        let mut events = match outcome {
            FetchOutcome::Found(items) => {
                self.items = items;
                self.load = LoadState::Loaded;
                vec![ViewEvent::CollectionReplaced(self.items.len())]
            }
            FetchOutcome::NotFound(message) => {
                self.items.clear();
                self.load = LoadState::NotFound(message.clone());
                vec![ViewEvent::NotFound(message)]
            }
            FetchOutcome::Failed(message) => {
                self.items.clear();
                self.load = LoadState::Failed(message.clone());
                vec![ViewEvent::LoadFailed(message)]
            }
        };
        events.extend(self.reconcile());
        events
    }

    pub fn dispatch(&mut self, command: ViewCommand) -> Vec<ViewEvent> {
        match command {
            ViewCommand::Select(key) => {
                if !self.rows().iter().any(|item| item.key() == key) {
                    return Vec::new();
                }
                self.selected = Some(key.clone());
                self.detail_open = true;
                vec![
                    ViewEvent::SelectionChanged(Some(key.clone())),
                    ViewEvent::DetailOpened(key),
                ]
            }
            ViewCommand::CloseDetail => {
                if self.selected.is_none() && !self.detail_open {
                    return Vec::new();
                }
                self.selected = None;
                self.detail_open = false;
                vec![ViewEvent::SelectionChanged(None), ViewEvent::DetailClosed]
            }
            ViewCommand::ToggleAccordion(index) => {
                if !self.config.accordion {
                    return Vec::new();
                }
                let next = if self.accordion == Some(index) || index >= self.rows().len() {
                    None
                } else {
                    Some(index)
                };
                if next == self.accordion {
                    return Vec::new();
                }
                self.accordion = next;
                vec![ViewEvent::AccordionChanged(next)]
            }
            ViewCommand::SelectGroup(key) => {
                if self.active_group.as_deref() == Some(key.as_str())
                    || !self.groups().iter().any(|group| group.key == key)
                {
                    return Vec::new();
                }
                self.active_group = Some(key.clone());
                let mut events = vec![ViewEvent::GroupChanged(Some(key))];
                events.extend(self.reconcile());
                events
            }
            ViewCommand::SetFilter(facet, choice) => {
                self.dropdown = None;
                if !self.config.filters.contains(&facet) || !self.filters.set(facet, choice) {
                    return Vec::new();
                }
                self.filter_changed(&[facet])
            }
            ViewCommand::ResetFilters => {
                self.dropdown = None;
                let cleared = self.filters.reset();
                if cleared.is_empty() {
                    return Vec::new();
                }
                self.filter_changed(&cleared)
            }
            ViewCommand::ToggleDropdown(facet) => {
                if !self.config.filters.contains(&facet) {
                    return Vec::new();
                }
                self.dropdown = if self.dropdown == Some(facet) {
                    None
                } else {
                    Some(facet)
                };
                vec![ViewEvent::DropdownChanged(self.dropdown)]
            }
            ViewCommand::SetPathParam(param) => {
                let param = param.filter(|value| !value.trim().is_empty());
                if param == self.path_param {
                    return Vec::new();
                }
                // Responses still in flight belong to the old parameter.
                self.path_param = param;
                self.items.clear();
                self.load = LoadState::Idle;
                self.latest_request = self.latest_request.wrapping_add(1);
                let mut events = self.reconcile();
                events.push(ViewEvent::RefetchNeeded);
                events
            }
        }
    }

    /// Records passing every active filter.
    pub fn visible(&self) -> Vec<&T> {
        filter_items(&self.items, &self.filters)
    }

    pub fn groups(&self) -> Vec<Group<'_, T>> {
        match self.config.grouping {
            Some(grouping) => group_items(self.visible(), grouping),
            None => Vec::new(),
        }
    }

    /// Records on screen: the visible records, narrowed to the active group
    /// tab when the page groups. Nothing is on screen until a load succeeds.
    pub fn rows(&self) -> Vec<&T> {
        if self.load != LoadState::Loaded {
            return Vec::new();
        }
        if self.config.grouping.is_none() {
            return self.visible();
        }
        let Some(active) = self.active_group.as_deref() else {
            return self.visible();
        };
        self.groups()
            .into_iter()
            .find(|group| group.key == active)
            .map(|group| group.items)
            .unwrap_or_default()
    }

    /// Installs the backend's full option list for a facet. Server-side
    /// facets need it because their loaded records are already narrowed.
    pub fn set_published_options(&mut self, facet: Facet, values: Vec<String>) -> bool {
        if !self.config.filters.contains(&facet) {
            return false;
        }
        self.published.insert(facet, values);
        true
    }

    /// Dropdown choices for a facet, from the published list when one is
    /// installed and from the loaded records otherwise. The current choice
    /// is always offered.
    pub fn filter_options(&self, facet: Facet) -> Vec<FilterChoice> {
        let mut options = match self.published.get(&facet) {
            Some(values) => listed_options(facet, values),
            None => facet_options(&self.items, facet),
        };
        let current = self.filters.choice(facet);
        if !options.contains(&current) {
            options.push(current);
        }
        options
    }

    fn filter_changed(&mut self, facets: &[Facet]) -> Vec<ViewEvent> {
        let mut events = facets
            .iter()
            .map(|facet| ViewEvent::FilterChanged(*facet))
            .collect::<Vec<_>>();
        if facets
            .iter()
            .any(|facet| self.config.remote_filters.contains(facet))
        {
            events.push(ViewEvent::RefetchNeeded);
        }
        events.extend(self.reconcile());
        events
    }

    /// Keeps view state pointing at records that are still on screen.
    /// A selection that disappears is cleared, never re-targeted.
    fn reconcile(&mut self) -> Vec<ViewEvent> {
        let mut events = Vec::new();

        if self.config.grouping.is_some() {
            let keys = self
                .groups()
                .into_iter()
                .map(|group| group.key)
                .collect::<Vec<_>>();
            let current_valid = self
                .active_group
                .as_ref()
                .is_some_and(|active| keys.contains(active));
            if !current_valid {
                let fallback = keys.into_iter().next();
                if fallback != self.active_group {
                    self.active_group = fallback;
                    events.push(ViewEvent::GroupChanged(self.active_group.clone()));
                }
            }
        }

        let row_keys = self
            .rows()
            .into_iter()
            .map(|item| item.key().to_owned())
            .collect::<Vec<_>>();

        let dangling = self
            .selected
            .as_ref()
            .is_some_and(|selected| !row_keys.contains(selected));
        if dangling {
            self.selected = None;
            events.push(ViewEvent::SelectionChanged(None));
            if self.detail_open {
                self.detail_open = false;
                events.push(ViewEvent::DetailClosed);
            }
        }

        if self.accordion.is_some_and(|index| index >= row_keys.len()) {
            self.accordion = None;
            events.push(ViewEvent::AccordionChanged(None));
        }

        events
    }
}
