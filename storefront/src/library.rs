//! Library of owned publications and the ownership query.

use chrono::{DateTime, Utc};
use scipub_core::{Publication, PublicationId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A publication the user owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedPublication {
    /// The owned publication
    pub publication: Publication,
    /// When the checkout that bought it settled
    pub purchased_at: DateTime<Utc>,
}

/// Append-only set of owned publications, in purchase order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Library {
    entries: Vec<OwnedPublication>,
    index: HashSet<PublicationId>,
}

impl Library {
    /// An empty library
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the library holds `id`
    #[must_use]
    pub fn is_owned(&self, id: &PublicationId) -> bool {
        self.index.contains(id)
    }

    /// Add `publications` in order, skipping any already owned.
    ///
    /// Returns the number of publications added.
    pub fn purchase(
        &mut self,
        publications: impl IntoIterator<Item = Publication>,
        at: DateTime<Utc>,
    ) -> usize {
        let before = self.entries.len();
        for publication in publications {
            if self.index.insert(publication.id.clone()) {
                self.entries.push(OwnedPublication {
                    publication,
                    purchased_at: at,
                });
            }
        }
        self.entries.len() - before
    }

    /// Owned publications in purchase order
    pub fn publications(&self) -> impl Iterator<Item = &Publication> {
        self.entries.iter().map(|entry| &entry.publication)
    }

    /// Entries with purchase timestamps
    #[must_use]
    pub fn entries(&self) -> &[OwnedPublication] {
        &self.entries
    }

    /// Number of owned publications
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is owned yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scipub_core::Category;
    use scipub_core::environment::Clock;
    use scipub_testing::fixtures::publication;
    use scipub_testing::test_clock;

    #[test]
    fn purchase_appends_in_order_with_timestamp() {
        let at = test_clock().now();
        let mut library = Library::new();
        let added = library.purchase(
            vec![
                publication("2", Category::Biology, 1850),
                publication("1", Category::Physics, 2999),
            ],
            at,
        );

        assert_eq!(added, 2);
        let ids: Vec<_> = library.publications().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        assert!(library.entries().iter().all(|e| e.purchased_at == at));
        assert!(library.is_owned(&PublicationId::new("1")));
        assert!(!library.is_owned(&PublicationId::new("3")));
    }

    #[test]
    fn owned_publications_are_not_duplicated() {
        let at = test_clock().now();
        let mut library = Library::new();
        library.purchase(vec![publication("1", Category::Physics, 100)], at);
        let added = library.purchase(
            vec![
                publication("1", Category::Physics, 100),
                publication("2", Category::Physics, 100),
            ],
            at,
        );

        assert_eq!(added, 1);
        assert_eq!(library.len(), 2);
    }
}
