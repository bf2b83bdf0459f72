//! Product listing criteria and result pages.

use serde::{Deserialize, Serialize};

use crate::defaults::{FIRST_PAGE, MAX_QUERY_LEN, PRODUCTS_PER_PAGE};
use crate::models::ProductSummary;

/// Column a product listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Name,
    Price,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::CreatedAt, SortField::Name, SortField::Price];

    /// Parse a query-string value; unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created_at" | "createdat" | "date" => Some(Self::CreatedAt),
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Name => "name",
            Self::Price => "price",
        }
    }

    /// Fully qualified column, safe to interpolate into SQL.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "p.created_at",
            Self::Name => "p.name",
            Self::Price => "p.price_cents",
        }
    }
}

/// Ordering direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters and ordering for a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSearch {
    /// Free text matched against name and description.
    pub query: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl ProductSearch {
    /// Trim the query, drop it when blank, cap its length, and swap an
    /// inverted price range.
    pub fn normalized(mut self) -> Self {
        self.query = self
            .query
            .map(|q| q.trim().chars().take(MAX_QUERY_LEN).collect::<String>())
            .filter(|q| !q.is_empty());

        if let (Some(min), Some(max)) = (self.min_price_cents, self.max_price_cents) {
            if min > max {
                self.min_price_cents = Some(max);
                self.max_price_cents = Some(min);
            }
        }
        self
    }

    pub fn is_filtered(&self) -> bool {
        self.query.is_some() || self.min_price_cents.is_some() || self.max_price_cents.is_some()
    }
}

/// Requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Page of the fixed listing size. Values below the first page clamp to it.
    pub fn new(page: i64) -> Self {
        Self::with_size(page, PRODUCTS_PER_PAGE)
    }

    pub fn with_size(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(FIRST_PAGE),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - FIRST_PAGE).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(FIRST_PAGE)
    }
}

/// One page of listing results with the total match count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<ProductSummary>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl ProductPage {
    /// Number of pages; an empty listing still has one (empty) page.
    pub fn page_count(&self) -> i64 {
        if self.total <= 0 {
            return 1;
        }
        (self.total + self.page_size - 1) / self.page_size
    }

    pub fn has_previous(&self) -> bool {
        self.page > FIRST_PAGE
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }
}
