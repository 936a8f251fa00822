// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;

/// A duplicate-free list that keeps insertion order. Operations are O(n), which is fine for
/// the small collections it backs (channel members, spectators, referees).
///
/// Intended for small [`Copy`] keys, so items are passed by value.
#[derive(Clone, PartialEq, Eq)]
pub struct OrderedSet<T> {
    contents: Vec<T>,
}

impl<T: Eq + Copy> OrderedSet<T> {
    pub const fn new() -> Self {
        Self {
            contents: Vec::new(),
        }
    }

    pub fn contains(&self, item: T) -> bool {
        self.contents.contains(&item)
    }

    /// Returns true if inserted, false if already contained.
    pub fn insert_back(&mut self, item: T) -> bool {
        if self.contains(item) {
            false
        } else {
            self.contents.push(item);
            true
        }
    }

    /// Returns true if was removed, false if didn't contain. Order of the rest is preserved.
    pub fn remove(&mut self, item: T) -> bool {
        if let Some(index) = self.position(item) {
            self.contents.remove(index);
            true
        } else {
            false
        }
    }

    fn position(&self, item: T) -> Option<usize> {
        self.contents.iter().position(|&i| i == item)
    }

    /// Iterates by value, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.contents.iter().copied()
    }

    /// Copies out the contents, e.g. to iterate while mutating the set.
    pub fn to_vec(&self) -> Vec<T> {
        self.contents.clone()
    }
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            contents: Vec::default(),
        }
    }
}

impl<T: Debug> Debug for OrderedSet<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.contents.iter()).finish()
    }
}

impl<T> Deref for OrderedSet<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.contents
    }
}
