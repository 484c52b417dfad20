//! The fixed pool of query shapes issued by query workers.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One of the four query shapes in the pool.
///
/// Each backend renders a shape into its own syntax; the worker only decides
/// which shape to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryShape {
    /// Exact match on the category tag.
    TermMatch,
    /// Numeric range over `doc_size`.
    NumericRange,
    /// Full-text match combined with a term filter.
    CompoundBoolean,
    /// Match-all with a category breakdown and no hits returned.
    Aggregation,
}

impl QueryShape {
    /// Every shape in the pool, in a stable order.
    pub const ALL: [QueryShape; 4] = [
        QueryShape::TermMatch,
        QueryShape::NumericRange,
        QueryShape::CompoundBoolean,
        QueryShape::Aggregation,
    ];

    /// Select a shape uniformly at random.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            QueryShape::TermMatch => "term_match",
            QueryShape::NumericRange => "numeric_range",
            QueryShape::CompoundBoolean => "compound_boolean",
            QueryShape::Aggregation => "aggregation",
        }
    }
}

impl std::fmt::Display for QueryShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
