//! Catalog store: the read-only list of publications and category tokens.

use chrono::NaiveDate;
use scipub_core::{Category, CategoryFilter, Money, MoneyError, Publication, PublicationId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use thiserror::Error;

/// Category tokens shown in the category bar; the first is the sentinel.
pub const CATEGORY_FILTERS: [CategoryFilter; 5] = [
    CategoryFilter::All,
    CategoryFilter::Only(Category::Physics),
    CategoryFilter::Only(Category::Biology),
    CategoryFilter::Only(Category::ComputerScience),
    CategoryFilter::Only(Category::Psychology),
];

/// Errors raised while loading catalog data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Two records share an identifier.
    #[error("duplicate publication id: {0}")]
    DuplicateId(PublicationId),

    /// A record's price is not a valid amount.
    #[error("invalid price for publication {id}: {source}")]
    InvalidPrice {
        /// Offending record
        id: PublicationId,
        /// Parse failure
        source: MoneyError,
    },

    /// A record's publication date is not `YYYY-MM-DD`.
    #[error("invalid publication date for publication {id}: {value}")]
    InvalidDate {
        /// Offending record
        id: PublicationId,
        /// The raw date
        value: String,
    },

    /// A record names a category outside the fixed set.
    #[error("unknown category for publication {id}: {token}")]
    UnknownCategory {
        /// Offending record
        id: PublicationId,
        /// The raw token
        token: String,
    },
}

/// A raw catalog record as shipped with the application.
#[derive(Clone, Copy, Debug)]
pub struct CatalogRecord {
    /// Identifier
    pub id: &'static str,
    /// Title
    pub title: &'static str,
    /// Author
    pub author: &'static str,
    /// Decimal price, e.g. `"29.99"`
    pub price: &'static str,
    /// Category token
    pub category: &'static str,
    /// Cover image URL
    pub cover_url: &'static str,
    /// Description
    pub description: &'static str,
    /// `YYYY-MM-DD`
    pub published: &'static str,
    /// Page count
    pub pages: u32,
}

impl CatalogRecord {
    /// Parse the record into a [`Publication`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the price, date or category is invalid.
    pub fn to_publication(&self) -> Result<Publication, CatalogError> {
        let id = PublicationId::new(self.id);
        let price = self
            .price
            .parse::<Money>()
            .map_err(|source| CatalogError::InvalidPrice {
                id: id.clone(),
                source,
            })?;
        let published = NaiveDate::parse_from_str(self.published, "%Y-%m-%d").map_err(|_| {
            CatalogError::InvalidDate {
                id: id.clone(),
                value: self.published.to_string(),
            }
        })?;
        let category =
            self.category
                .parse::<Category>()
                .map_err(|_| CatalogError::UnknownCategory {
                    id: id.clone(),
                    token: self.category.to_string(),
                })?;

        Ok(Publication {
            id,
            title: self.title.to_string(),
            author: self.author.to_string(),
            price,
            category,
            cover_url: self.cover_url.to_string(),
            description: self.description.to_string(),
            published,
            pages: self.pages,
        })
    }
}

/// The SciPub seed catalog.
pub const SCIPUB_RECORDS: [CatalogRecord; 8] = [
    CatalogRecord {
        id: "1",
        title: "Quantum Mechanics: The Theoretical Minimum",
        author: "Leonard Susskind",
        price: "29.99",
        category: "Physics",
        cover_url: "https://picsum.photos/seed/quantum/300/450",
        description: "A comprehensive introduction to the principles of quantum mechanics for serious students.",
        published: "2014-01-01",
        pages: 360,
    },
    CatalogRecord {
        id: "2",
        title: "The Gene: An Intimate History",
        author: "Siddhartha Mukherjee",
        price: "18.50",
        category: "Biology",
        cover_url: "https://picsum.photos/seed/gene/300/450",
        description: "A magnificent history of the gene and a response to the defining question of the future.",
        published: "2016-05-17",
        pages: 592,
    },
    CatalogRecord {
        id: "3",
        title: "Clean Architecture",
        author: "Robert C. Martin",
        price: "34.99",
        category: "Computer Science",
        cover_url: "https://picsum.photos/seed/arch/300/450",
        description: "A craftsman's guide to software structure and design.",
        published: "2017-09-10",
        pages: 432,
    },
    CatalogRecord {
        id: "4",
        title: "Astrophysics for People in a Hurry",
        author: "Neil deGrasse Tyson",
        price: "14.99",
        category: "Physics",
        cover_url: "https://picsum.photos/seed/astro/300/450",
        description: "What is the nature of space and time? How do we fit within the universe?",
        published: "2017-05-02",
        pages: 224,
    },
    CatalogRecord {
        id: "5",
        title: "Deep Learning",
        author: "Ian Goodfellow",
        price: "79.99",
        category: "Computer Science",
        cover_url: "https://picsum.photos/seed/deep/300/450",
        description: "The definitive text on deep learning by the pioneers of the field.",
        published: "2016-11-18",
        pages: 800,
    },
    CatalogRecord {
        id: "6",
        title: "Thinking, Fast and Slow",
        author: "Daniel Kahneman",
        price: "12.99",
        category: "Psychology",
        cover_url: "https://picsum.photos/seed/think/300/450",
        description: "The major work of the Nobel Prize winner in Economics.",
        published: "2011-10-25",
        pages: 499,
    },
    CatalogRecord {
        id: "7",
        title: "Molecular Biology of the Cell",
        author: "Bruce Alberts",
        price: "125.00",
        category: "Biology",
        cover_url: "https://picsum.photos/seed/cell/300/450",
        description: "The classic textbook for cell biology, updated with latest research.",
        published: "2014-11-15",
        pages: 1464,
    },
    CatalogRecord {
        id: "8",
        title: "Structure and Interpretation of Computer Programs",
        author: "Harold Abelson",
        price: "55.00",
        category: "Computer Science",
        cover_url: "https://picsum.photos/seed/sicp/300/450",
        description: "A classic text in computer science education.",
        published: "1996-07-25",
        pages: 657,
    },
];

/// Immutable collection of publications, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    publications: Vec<Publication>,
    index: HashMap<PublicationId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] for the first repeated identifier.
    pub fn new(publications: Vec<Publication>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(publications.len());
        for (position, publication) in publications.iter().enumerate() {
            match index.entry(publication.id.clone()) {
                Entry::Occupied(_) => return Err(CatalogError::DuplicateId(publication.id.clone())),
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
            }
        }
        Ok(Self {
            publications,
            index,
        })
    }

    /// Load a catalog from raw records.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] for the first invalid record or duplicate id.
    pub fn from_records(records: &[CatalogRecord]) -> Result<Self, CatalogError> {
        let publications = records
            .iter()
            .map(CatalogRecord::to_publication)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(publications)
    }

    /// The eight-title SciPub catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the bundled records are invalid.
    pub fn scipub() -> Result<Self, CatalogError> {
        Self::from_records(&SCIPUB_RECORDS)
    }

    /// Look up a publication by identifier.
    #[must_use]
    pub fn get(&self, id: &PublicationId) -> Option<&Publication> {
        self.index.get(id).map(|&position| &self.publications[position])
    }

    /// All publications in source order.
    #[must_use]
    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    /// Category filters in display order, `All` first.
    #[must_use]
    pub const fn categories() -> &'static [CategoryFilter] {
        &CATEGORY_FILTERS
    }

    /// Number of publications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.publications.len()
    }

    /// Whether the catalog has no publications.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }
}
