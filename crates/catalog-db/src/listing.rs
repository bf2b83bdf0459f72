//! SQL generation for the filtered product listing.

use catalog_core::ProductSearch;

use crate::escape_like;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// String parameter.
    String(String),
    /// 64-bit integer parameter.
    BigInt(i64),
}

/// Generates the WHERE and ORDER BY fragments of a product listing.
///
/// The product table is aliased `p`. Sort columns come from a closed enum,
/// so only values are bound as parameters.
///
/// # Example
///
/// ```rust,ignore
/// use catalog_db::listing::ProductListQueryBuilder;
///
/// let (where_sql, params) = ProductListQueryBuilder::new(&search, 0).build_where();
/// // where_sql: "(p.name ILIKE $1 ESCAPE '\' OR p.description ILIKE $1 ESCAPE '\') AND p.price_cents >= $2"
/// ```
pub struct ProductListQueryBuilder<'a> {
    search: &'a ProductSearch,
    param_offset: usize,
}

impl<'a> ProductListQueryBuilder<'a> {
    /// Create a builder.
    ///
    /// `param_offset` is the number of parameters already in the query.
    pub fn new(search: &'a ProductSearch, param_offset: usize) -> Self {
        Self {
            search,
            param_offset,
        }
    }

    /// Build the WHERE clause fragment and its parameters.
    ///
    /// Returns `("TRUE", [])` when no filter is set.
    pub fn build_where(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        if let Some(query) = &self.search.query {
            param_idx += 1;
            clauses.push(format!(
                "(p.name ILIKE ${0} ESCAPE '\\' OR p.description ILIKE ${0} ESCAPE '\\')",
                param_idx
            ));
            params.push(QueryParam::String(format!("%{}%", escape_like(query))));
        }

        if let Some(min) = self.search.min_price_cents {
            param_idx += 1;
            clauses.push(format!("p.price_cents >= ${}", param_idx));
            params.push(QueryParam::BigInt(min));
        }

        if let Some(max) = self.search.max_price_cents {
            param_idx += 1;
            clauses.push(format!("p.price_cents <= ${}", param_idx));
            params.push(QueryParam::BigInt(max));
        }

        if clauses.is_empty() {
            return ("TRUE".to_string(), params);
        }
        (clauses.join(" AND "), params)
    }

    /// ORDER BY fragment (without the keyword).
    ///
    /// Ties are broken by id in the same direction so pages never overlap.
    pub fn build_order_by(&self) -> String {
        let dir = self.search.direction.sql();
        format!("{} {}, p.id {}", self.search.sort.column(), dir, dir)
    }
}
