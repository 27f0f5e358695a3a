// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::model::{Facet, ListingItem, MatchMode};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterChoice {
    #[default]
    All,
    Value(String),
}

impl FilterChoice {
    /// Interprets a dropdown label; only the facet's exact sentinel string
    /// means "no constraint".
    pub fn from_label(facet: Facet, label: &str) -> Self {
        if label == facet.sentinel() {
            Self::All
        } else {
            Self::Value(label.to_owned())
        }
    }

    pub fn label(&self, facet: Facet) -> String {
        match self {
            Self::All => facet.sentinel().to_owned(),
            Self::Value(value) => value.clone(),
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Value(value) => Some(value),
        }
    }

    pub fn accepts(&self, facet: Facet, candidate: Option<&str>) -> bool {
        let Self::Value(wanted) = self else {
            return true;
        };
        let Some(candidate) = candidate else {
            return false;
        };
        match facet.match_mode() {
            MatchMode::Exact => candidate == wanted,
            MatchMode::CaseInsensitive => candidate.eq_ignore_ascii_case(wanted),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    choices: BTreeMap<Facet, FilterChoice>,
}

impl FilterSelection {
    pub fn choice(&self, facet: Facet) -> FilterChoice {
        self.choices.get(&facet).cloned().unwrap_or_default()
    }

    pub fn value(&self, facet: Facet) -> Option<&str> {
        self.choices.get(&facet).and_then(FilterChoice::value)
    }

    /// Returns whether the selection actually changed.
    pub fn set(&mut self, facet: Facet, choice: FilterChoice) -> bool {
        if self.choice(facet) == choice {
            return false;
        }
        match choice {
            FilterChoice::All => {
                self.choices.remove(&facet);
            }
            value @ FilterChoice::Value(_) => {
                self.choices.insert(facet, value);
            }
        }
        true
    }

    pub fn reset(&mut self) -> Vec<Facet> {
        let cleared = self.choices.keys().copied().collect();
        self.choices.clear();
        cleared
    }

    pub fn is_unconstrained(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn matches<T: ListingItem>(&self, item: &T) -> bool {
        self.choices
            .iter()
            .all(|(facet, choice)| choice.accepts(*facet, item.facet(*facet)))
    }

    /// Query pairs for the facets the server filters on; sentinels are never
    /// sent.
    pub fn query_params(&self, facets: &[Facet]) -> Vec<(String, String)> {
        facets
            .iter()
            .filter_map(|facet| {
                self.value(*facet)
                    .map(|value| (facet.query_key().to_owned(), value.to_owned()))
            })
            .collect()
    }
}

pub fn filter_items<'a, T: ListingItem>(items: &'a [T], selection: &FilterSelection) -> Vec<&'a T> {
    items.iter().filter(|item| selection.matches(*item)).collect()
}

/// Dropdown options for a facet: the sentinel first, then each distinct
/// value in first-seen order.
pub fn facet_options<T: ListingItem>(items: &[T], facet: Facet) -> Vec<FilterChoice> {
    distinct_choices(facet, items.iter().filter_map(|item| item.facet(facet)))
}

/// Dropdown options from a list the backend publishes (model names,
/// accessory categories). Blank entries are skipped.
pub fn listed_options(facet: Facet, values: &[String]) -> Vec<FilterChoice> {
    distinct_choices(
        facet,
        values
            .iter()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty()),
    )
}

fn distinct_choices<'a>(facet: Facet, values: impl Iterator<Item = &'a str>) -> Vec<FilterChoice> {
    let mut options = vec![FilterChoice::All];
    for value in values {
        let seen = options.iter().any(|option| match option {
            FilterChoice::All => false,
            FilterChoice::Value(existing) => match facet.match_mode() {
                MatchMode::Exact => existing == value,
                MatchMode::CaseInsensitive => existing.eq_ignore_ascii_case(value),
            },
        });
        if !seen {
            options.push(FilterChoice::Value(value.to_owned()));
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::{FilterChoice, FilterSelection, facet_options, filter_items, listed_options};
    use crate::{Facet, ListingItem, Vehicle, VehicleId};

    fn vehicle(id: &str, model: &str, fuel: &str, transmission: &str) -> Vehicle {
        Vehicle {
            id: VehicleId::new(id),
            name: format!("{model} {id}"),
            model: model.to_owned(),
            fuel_type: fuel.to_owned(),
            transmission: transmission.to_owned(),
            ..Vehicle::default()
        }
    }

    fn catalogue() -> Vec<Vehicle> {
        vec![
            vehicle("1", "Swift", "Petrol", "Manual"),
            vehicle("2", "Swift", "CNG", "Manual"),
            vehicle("3", "Brezza", "petrol", "Automatic"),
            vehicle("4", "Ertiga", "Diesel", "Automatic"),
        ]
    }

    #[test]
    fn sentinel_selection_shows_everything() {
        let items = catalogue();
        let mut selection = FilterSelection::default();
        selection.set(
            Facet::Model,
            FilterChoice::from_label(Facet::Model, "All Models"),
        );
        selection.set(
            Facet::FuelType,
            FilterChoice::from_label(Facet::FuelType, "All Fuel Types"),
        );

        assert!(selection.is_unconstrained());
        assert_eq!(filter_items(&items, &selection).len(), items.len());
    }

    #[test]
    fn exact_facets_match_case_sensitively() {
        let items = catalogue();
        let mut selection = FilterSelection::default();
        selection.set(Facet::Model, FilterChoice::Value("Swift".to_owned()));

        let visible = filter_items(&items, &selection);
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|item| item.model == "Swift"));

        selection.set(Facet::Model, FilterChoice::Value("swift".to_owned()));
        assert!(filter_items(&items, &selection).is_empty());
    }

    #[test]
    fn case_insensitive_facets_ignore_case() {
        let items = catalogue();
        let mut selection = FilterSelection::default();
        selection.set(Facet::FuelType, FilterChoice::Value("PETROL".to_owned()));

        let keys = filter_items(&items, &selection)
            .into_iter()
            .map(|item| item.key().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["1".to_owned(), "3".to_owned()]);
    }

    #[test]
    fn combined_filters_intersect() {
        let items = catalogue();
        let mut selection = FilterSelection::default();
        selection.set(Facet::Model, FilterChoice::Value("Swift".to_owned()));
        selection.set(Facet::FuelType, FilterChoice::Value("CNG".to_owned()));

        let visible = filter_items(&items, &selection);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].key(), "2");
    }

    #[test]
    fn near_miss_sentinel_is_a_real_value() {
        assert_eq!(
            FilterChoice::from_label(Facet::Model, "all models"),
            FilterChoice::Value("all models".to_owned())
        );
    }

    #[test]
    fn set_reports_changes_only() {
        let mut selection = FilterSelection::default();
        assert!(!selection.set(Facet::Model, FilterChoice::All));
        assert!(selection.set(Facet::Model, FilterChoice::Value("Swift".to_owned())));
        assert!(!selection.set(Facet::Model, FilterChoice::Value("Swift".to_owned())));
        assert_eq!(selection.reset(), vec![Facet::Model]);
        assert!(selection.is_unconstrained());
    }

    #[test]
    fn query_params_skip_sentinels_and_local_facets() {
        let mut selection = FilterSelection::default();
        selection.set(Facet::Category, FilterChoice::Value("Interior".to_owned()));
        selection.set(Facet::Model, FilterChoice::Value("Swift".to_owned()));

        assert_eq!(
            selection.query_params(&[Facet::Category, Facet::FuelType]),
            vec![("category".to_owned(), "Interior".to_owned())]
        );
    }

    #[test]
    fn facet_options_dedupe_in_first_seen_order() {
        let items = catalogue();
        let options = facet_options(&items, Facet::FuelType);
        assert_eq!(
            options,
            vec![
                FilterChoice::All,
                FilterChoice::Value("Petrol".to_owned()),
                FilterChoice::Value("CNG".to_owned()),
                FilterChoice::Value("Diesel".to_owned()),
            ]
        );
    }

    #[test]
    fn listed_options_skip_blanks_and_duplicates() {
        let published = vec![
            "Interior".to_owned(),
            " ".to_owned(),
            "Exterior".to_owned(),
            "Interior".to_owned(),
        ];
        assert_eq!(
            listed_options(Facet::Category, &published),
            vec![
                FilterChoice::All,
                FilterChoice::Value("Interior".to_owned()),
                FilterChoice::Value("Exterior".to_owned()),
            ]
        );
    }
}
