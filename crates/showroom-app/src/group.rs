// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{Facet, ListingItem};

/// Bucket name for records that carry no value for the grouping facet.
pub const UNGROUPED: &str = "General";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    Insertion,
    Alphabetical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grouping {
    pub facet: Facet,
    pub order: GroupOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a, T> {
    pub key: String,
    pub items: Vec<&'a T>,
}

pub fn group_items<'a, T, I>(items: I, grouping: Grouping) -> Vec<Group<'a, T>>
where
    T: ListingItem,
    I: IntoIterator<Item = &'a T>,
{
    let mut groups: Vec<Group<'a, T>> = Vec::new();
    for item in items {
        let key = item.facet(grouping.facet).unwrap_or(UNGROUPED);
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.items.push(item),
            None => groups.push(Group {
                key: key.to_owned(),
                items: vec![item],
            }),
        }
    }
    if grouping.order == GroupOrder::Alphabetical {
        groups.sort_by(|left, right| {
            left.key
                .to_ascii_lowercase()
                .cmp(&right.key.to_ascii_lowercase())
        });
    }
    groups
}
