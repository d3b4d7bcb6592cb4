//! Query criteria
//!
//! Criteria select documents by exact field equality, optionally combined
//! with a single disjunction of sub-conditions:
//!
//! ```text
//! {"userId": 4}                                       userId == 4
//! {"$or": [{"first_name": "Ada"}, {"last_name": "Ada"}]}  either name is "Ada"
//! {}                                                  every document
//! ```
//!
//! Matching never coerces between types: `1` does not match `"1"`, and
//! `1` does not match `1.0`.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::Document;

/// Key introducing the disjunction in the JSON form
pub const OR_KEY: &str = "$or";

/// Errors from parsing criteria out of JSON
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("Criteria must be a JSON object")]
    NotAnObject,

    #[error("'$or' must be an array of objects")]
    InvalidDisjunction,

    #[error("Unsupported operator '{0}'")]
    UnknownOperator(String),
}

/// A set of field equality conditions that must all hold
pub type Conditions = Map<String, Value>;

/// Predicate used by `find_one_by` and `find_by`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    fields: Conditions,
    any_of: Option<Vec<Conditions>>,
}

impl Criteria {
    /// Criteria matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Criteria with a single equality condition
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().field(key, value)
    }

    /// Criteria matching documents that satisfy any of `alternatives`
    pub fn any_of<I>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = Conditions>,
    {
        Self {
            fields: Map::new(),
            any_of: Some(alternatives.into_iter().collect()),
        }
    }

    /// Add an equality condition
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Parse the JSON form: field conditions plus an optional `$or` array
    pub fn from_value(value: &Value) -> Result<Self, CriteriaError> {
        let object = value.as_object().ok_or(CriteriaError::NotAnObject)?;
        let mut criteria = Self::all();

        for (key, expected) in object {
            if key == OR_KEY {
                let alternatives = expected
                    .as_array()
                    .ok_or(CriteriaError::InvalidDisjunction)?
                    .iter()
                    .map(|alt| alt.as_object().cloned().ok_or(CriteriaError::InvalidDisjunction))
                    .collect::<Result<Vec<_>, _>>()?;
                criteria.any_of = Some(alternatives);
            } else if key.starts_with('$') {
                return Err(CriteriaError::UnknownOperator(key.clone()));
            } else {
                criteria.fields.insert(key.clone(), expected.clone());
            }
        }

        Ok(criteria)
    }

    /// True when these criteria match every document
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.any_of.is_none()
    }

    /// Whether `doc` satisfies these criteria
    pub fn matches(&self, doc: &Document) -> bool {
        if !conditions_hold(&self.fields, doc) {
            return false;
        }
        match &self.any_of {
            None => true,
            // an empty disjunction has no satisfiable branch
            Some(alternatives) => alternatives.iter().any(|alt| conditions_hold(alt, doc)),
        }
    }
}

fn conditions_hold(conditions: &Conditions, doc: &Document) -> bool {
    conditions.iter().all(|(key, expected)| match doc.lookup(key) {
        Some(actual) => actual.as_ref() == expected,
        None => expected.is_null(),
    })
}
