//! Publication records and category tags.

use crate::money::Money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier of a publication in the catalog
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicationId(String);

impl PublicationId {
    /// Creates an identifier from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PublicationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Subject category of a publication
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Physics and astronomy
    Physics,
    /// Life sciences
    Biology,
    /// Computing
    #[serde(rename = "Computer Science")]
    ComputerScience,
    /// Psychology and behavioral science
    Psychology,
}

impl Category {
    /// Every category, in storefront display order
    pub const ALL: [Self; 4] = [
        Self::Physics,
        Self::Biology,
        Self::ComputerScience,
        Self::Psychology,
    ];

    /// Human-readable name, also used as the category token
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Physics => "Physics",
            Self::Biology => "Biology",
            Self::ComputerScience => "Computer Science",
            Self::Psychology => "Psychology",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A category token did not name any known category
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(token.trim()))
            .ok_or_else(|| UnknownCategory(token.to_string()))
    }
}

/// Category selection applied to the catalog
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryFilter {
    /// Show every category; token `"All"`
    #[default]
    All,
    /// Show a single category
    Only(Category),
}

impl CategoryFilter {
    /// Token of the "show all" sentinel
    pub const ALL_TOKEN: &'static str = "All";

    /// Whether a publication in `category` passes this filter
    #[must_use]
    pub fn admits(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => *selected == category,
        }
    }

    /// Token shown in the category bar
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::All => Self::ALL_TOKEN,
            Self::Only(category) => category.name(),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.trim().eq_ignore_ascii_case(Self::ALL_TOKEN) {
            Ok(Self::All)
        } else {
            token.parse().map(Self::Only)
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        Self::Only(category)
    }
}

/// A purchasable digital title
///
/// Created once from static catalog data and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    /// Unique identifier
    pub id: PublicationId,
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// Price
    pub price: Money,
    /// Subject category
    pub category: Category,
    /// Cover image reference
    pub cover_url: String,
    /// Blurb shown in the detail view
    pub description: String,
    /// Publication date
    pub published: NaiveDate,
    /// Page count
    pub pages: u32,
}
