//! Cart manager.

use scipub_core::{Money, Publication, PublicationId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One publication selected for purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// The selected publication
    pub publication: Publication,
    /// Always 1: adding a publication twice does not increment it
    pub quantity: u32,
}

impl CartEntry {
    /// Entry for a single copy of `publication`
    #[must_use]
    pub const fn new(publication: Publication) -> Self {
        Self {
            publication,
            quantity: 1,
        }
    }

    /// Identifier of the entry's publication
    #[must_use]
    pub const fn id(&self) -> &PublicationId {
        &self.publication.id
    }
}

/// Ordered cart with at most one entry per publication.
///
/// Entries keep insertion order for display; membership is answered from a
/// set index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cart {
    entries: Vec<CartEntry>,
    index: HashSet<PublicationId>,
}

impl Cart {
    /// An empty cart
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `publication` unless it is already present.
    ///
    /// Returns whether an entry was added.
    pub fn add(&mut self, publication: Publication) -> bool {
        if !self.index.insert(publication.id.clone()) {
            return false;
        }
        self.entries.push(CartEntry::new(publication));
        true
    }

    /// Remove the entry for `id` if present.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, id: &PublicationId) -> bool {
        if !self.index.remove(id) {
            return false;
        }
        self.entries.retain(|entry| entry.id() != id);
        true
    }

    /// Remove every entry whose identifier is in `ids`.
    pub fn remove_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a PublicationId>) {
        let doomed: HashSet<&PublicationId> = ids.into_iter().collect();
        if doomed.is_empty() {
            return;
        }
        self.entries.retain(|entry| !doomed.contains(entry.id()));
        self.index.retain(|id| !doomed.contains(id));
    }

    /// Sum of entry prices; zero for an empty cart.
    #[must_use]
    pub fn total(&self) -> Money {
        self.entries.iter().map(|entry| entry.publication.price).sum()
    }

    /// Whether `id` is in the cart
    #[must_use]
    pub fn contains(&self, id: &PublicationId) -> bool {
        self.index.contains(id)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Copy of the current entries, used as a checkout snapshot
    #[must_use]
    pub fn take_snapshot(&self) -> Vec<CartEntry> {
        self.entries.clone()
    }
}
