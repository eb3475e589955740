//! Sentinel-linked ordered set of identifiers.
//!
//! Entries are chained through an explicit successor map that starts and ends
//! at [`SENTINEL`]. New entries are linked directly after the sentinel, so
//! enumeration yields the most recently added entry first. Removal is O(1)
//! when the caller names the predecessor; [`OrderedIdentifierSet::find_predecessor`]
//! derives the hint by walking the chain for callers that do not know it.

use std::collections::HashMap;

use borsh::{BorshDeserialize, BorshSerialize};
use warden_assertions::{check_condition, check_nonzero};

use crate::{Address, StateError, SENTINEL};

/// One bounded slice of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Entries following the requested cursor, most recent first.
    pub entries: Vec<Address>,
    /// Cursor for the next call, or [`SENTINEL`] once the chain is exhausted.
    pub next: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct OrderedIdentifierSet {
    links: HashMap<Address, Address>,
}

impl OrderedIdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn head(&self) -> Address {
        self.links.get(&SENTINEL).copied().unwrap_or(SENTINEL)
    }

    fn check_identifier(id: &Address) -> Result<(), StateError> {
        check_nonzero(id.as_ref(), StateError::InvalidIdentifier)?;
        check_condition(*id != SENTINEL, StateError::InvalidIdentifier)
    }

    pub fn contains(&self, id: &Address) -> bool {
        *id != SENTINEL && self.links.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.head() == SENTINEL
    }

    /// Number of entries. Walks the whole chain.
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    /// Entry linked after `id` (the sentinel yields the head).
    pub fn successor(&self, id: &Address) -> Option<Address> {
        if *id == SENTINEL {
            return Some(self.head());
        }
        self.links.get(id).copied()
    }

    /// Links `id` at the head of the chain.
    pub fn add(&mut self, id: Address) -> Result<(), StateError> {
        Self::check_identifier(&id)?;
        if self.contains(&id) {
            return Err(StateError::AlreadyExists);
        }
        let head = self.head();
        self.links.insert(id, head);
        self.links.insert(SENTINEL, id);
        Ok(())
    }

    /// Unlinks `id`; `prev` must be the entry (or sentinel) immediately before it.
    pub fn remove(&mut self, prev: Address, id: Address) -> Result<(), StateError> {
        if !self.contains(&id) {
            return Err(StateError::NotFound);
        }
        if self.successor(&prev) != Some(id) {
            return Err(StateError::StalePredecessor);
        }
        let after = self.links.remove(&id).ok_or(StateError::NotFound)?;
        if prev == SENTINEL && after == SENTINEL {
            self.links.remove(&SENTINEL);
        } else {
            self.links.insert(prev, after);
        }
        Ok(())
    }

    /// Unlinks `id` after deriving its predecessor by enumeration.
    pub fn remove_auto(&mut self, id: Address) -> Result<(), StateError> {
        let prev = self.find_predecessor(&id)?;
        self.remove(prev, id)
    }

    /// Swaps `old` for `new` in place.
    pub fn replace(&mut self, old: Address, new: Address) -> Result<(), StateError> {
        Self::check_identifier(&new)?;
        if !self.contains(&old) {
            return Err(StateError::NotFound);
        }
        if self.contains(&new) {
            return Err(StateError::AlreadyExists);
        }
        let prev = self.find_predecessor(&old)?;
        let after = self.links.remove(&old).ok_or(StateError::NotFound)?;
        self.links.insert(new, after);
        self.links.insert(prev, new);
        Ok(())
    }

    /// Returns up to `limit` entries following `from` (the sentinel starts at the head).
    pub fn list(&self, from: Address, limit: usize) -> Result<Page, StateError> {
        if from != SENTINEL && !self.contains(&from) {
            return Err(StateError::NotFound);
        }
        let mut entries = Vec::with_capacity(limit.min(64));
        let mut cursor = self.successor(&from).unwrap_or(SENTINEL);
        while cursor != SENTINEL && entries.len() < limit {
            entries.push(cursor);
            cursor = self.successor(&cursor).unwrap_or(SENTINEL);
        }
        let next = match entries.last() {
            Some(last) if cursor != SENTINEL => *last,
            _ => SENTINEL,
        };
        Ok(Page { entries, next })
    }

    /// Entry (or sentinel) immediately before `id`.
    pub fn find_predecessor(&self, id: &Address) -> Result<Address, StateError> {
        if !self.contains(id) {
            return Err(StateError::NotFound);
        }
        let mut prev = SENTINEL;
        for entry in self.iter() {
            if entry == *id {
                return Ok(prev);
            }
            prev = entry;
        }
        Err(StateError::NotFound)
    }

    /// Full enumeration, most recent first.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            set: self,
            cursor: self.head(),
        }
    }
}

pub struct Iter<'a> {
    set: &'a OrderedIdentifierSet,
    cursor: Address,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == SENTINEL {
            return None;
        }
        let current = self.cursor;
        self.cursor = self.set.successor(&current).unwrap_or(SENTINEL);
        Some(current)
    }
}
