//! Filtered nearest-neighbour query construction for a pgvector table.
//!
//! The table layout is the one the self-hosted memory engine writes:
//!
//! - `id`: uuid primary key
//! - `vector`: pgvector column
//! - `payload`: jsonb with `data`, `hash`, `user_id`, `run_id`, `agent_id`,
//!   `created_at`, `updated_at`
//!
//! Every value reaches the database as a bound parameter. The only pieces
//! spliced into the SQL text are the collection name (validated as a plain
//! identifier when it is parsed) and payload keys from the closed
//! [`FilterField`] set.

use std::fmt;

use super::types::SearchFilter;

/// Records must score strictly above this to be returned.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.2;
/// Maximum number of rows a search returns.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Identity tags a search can filter on. Each maps to a fixed payload key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    UserId,
    RunId,
    AgentId,
}

impl FilterField {
    pub const ALL: [FilterField; 3] = [FilterField::UserId, FilterField::RunId, FilterField::AgentId];

    pub fn payload_key(self) -> &'static str {
        match self {
            FilterField::UserId => "user_id",
            FilterField::RunId => "run_id",
            FilterField::AgentId => "agent_id",
        }
    }

    fn value_in(self, filter: &SearchFilter) -> Option<&str> {
        match self {
            FilterField::UserId => filter.user_id.as_deref(),
            FilterField::RunId => filter.run_id.as_deref(),
            FilterField::AgentId => filter.agent_id.as_deref(),
        }
    }
}

/// Equality constraint `payload->>'<field>' = <value>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: FilterField,
    pub value: String,
}

/// A validated table name. Letters, digits and underscores, not starting
/// with a digit, at most 63 bytes (the Postgres identifier limit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn parse(name: &str) -> Result<Self, String> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_start || !valid_rest || name.len() > 63 {
            return Err(format!(
                "'{name}' is not a valid collection name (letters, digits and underscores only)"
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// Parameter bound to a placeholder, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Float(f64),
    Int(i64),
}

/// A similarity search ready to be rendered against a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityQuery {
    pub embedding: Vec<f32>,
    pub predicates: Vec<Predicate>,
    pub threshold: f64,
    pub limit: usize,
}

impl SimilarityQuery {
    /// Only the filter fields that are set become predicates. No predicates
    /// means no identity restriction.
    pub fn new(embedding: Vec<f32>, filter: &SearchFilter, threshold: f64, limit: usize) -> Self {
        let predicates = FilterField::ALL
            .into_iter()
            .filter_map(|field| {
                field.value_in(filter).map(|value| Predicate {
                    field,
                    value: value.to_string(),
                })
            })
            .collect();

        Self {
            embedding,
            predicates,
            threshold,
            limit,
        }
    }

    /// Strict: a score equal to the threshold is excluded.
    pub fn admits(&self, score: f64) -> bool {
        score > self.threshold
    }

    /// pgvector text form, e.g. `[0.1,0.2,0.3]`.
    pub fn vector_literal(&self) -> String {
        let parts: Vec<String> = self.embedding.iter().map(|v| v.to_string()).collect();
        format!("[{}]", parts.join(","))
    }

    /// Render the SQL. Placeholders: `$1` vector, `$2` threshold, then one
    /// per predicate in [`FilterField::ALL`] order, then the limit.
    pub fn to_sql(&self, collection: &CollectionName) -> String {
        let similarity = "1 - (vector <=> $1::vector)";

        let mut conditions = vec![format!("{similarity} > $2")];
        for (i, predicate) in self.predicates.iter().enumerate() {
            conditions.push(format!(
                "payload->>'{}' = ${}",
                predicate.field.payload_key(),
                i + 3
            ));
        }
        let limit_placeholder = self.predicates.len() + 3;

        let tags = FilterField::ALL
            .iter()
            .map(|f| format!("payload->>'{0}' AS {0}", f.payload_key()))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "SELECT id::text AS id, payload->>'data' AS memory, {tags}, {similarity} AS similarity \
             FROM {collection} \
             WHERE {} \
             ORDER BY similarity DESC, id ASC \
             LIMIT ${limit_placeholder}",
            conditions.join(" AND ")
        )
    }

    /// Values for the placeholders of [`Self::to_sql`], in order.
    pub fn params(&self) -> Vec<QueryParam> {
        let mut params = Vec::with_capacity(self.predicates.len() + 3);
        params.push(QueryParam::Text(self.vector_literal()));
        params.push(QueryParam::Float(self.threshold));
        params.extend(
            self.predicates
                .iter()
                .map(|p| QueryParam::Text(p.value.clone())),
        );
        params.push(QueryParam::Int(self.limit as i64));
        params
    }
}
