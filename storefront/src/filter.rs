//! Filter engine: the visible subset of the catalog.

use crate::catalog::Catalog;
use scipub_core::{CategoryFilter, Publication};
use serde::{Deserialize, Serialize};

/// Category and free-text query applied to the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Selected category
    pub category: CategoryFilter,
    /// Free-text query matched against title and author
    pub query: String,
}

impl Filter {
    /// Whether `publication` passes both the category and the query.
    #[must_use]
    pub fn matches(&self, publication: &Publication) -> bool {
        self.category.admits(publication.category)
            && matches_query(publication, &self.query.to_lowercase())
    }

    /// Apply the filter to a catalog, keeping catalog order.
    #[must_use]
    pub fn apply<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Publication> {
        filter_publications(catalog, &self.category, &self.query)
    }
}

/// Publications in `catalog` matching `category` whose title or author
/// contains `query`, ignoring case.
///
/// An empty query matches every publication. Results keep catalog order.
#[must_use]
pub fn filter_publications<'a>(
    catalog: &'a Catalog,
    category: &CategoryFilter,
    query: &str,
) -> Vec<&'a Publication> {
    let needle = query.to_lowercase();
    catalog
        .publications()
        .iter()
        .filter(|publication| category.admits(publication.category))
        .filter(|publication| matches_query(publication, &needle))
        .collect()
}

// `needle` is already lower-cased.
fn matches_query(publication: &Publication, needle: &str) -> bool {
    needle.is_empty()
        || publication.title.to_lowercase().contains(needle)
        || publication.author.to_lowercase().contains(needle)
}
