//! # Query Model
//!
//! Condition trees, query requests, and result pages for the paged search
//! protocol. A `ConditionTree` is a finite boolean AND/OR structure whose
//! leaves name a field, an operator from a closed set, and a value; the
//! remote host-response service evaluates it, this side only validates and
//! serializes it.

use crate::errors::QueryError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Operators a condition leaf may use. Closed set per the service contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOp {
    /// Exact match.
    Equals,
    /// Negated exact match.
    NotEquals,
    /// Substring match.
    Contains,
    /// Numeric greater-than.
    GreaterThan,
    /// Numeric less-than.
    LessThan,
}

impl ConditionOp {
    /// The operator token the wire protocol expects.
    #[must_use]
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::Contains => "CONTAINS",
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
        }
    }
}

/// A single field-operator-value leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Collector name the field belongs to (e.g. `HostInfo`).
    pub name: String,
    /// Output field within the collector (e.g. `ip_address`).
    pub output: String,
    /// Comparison operator.
    pub op: ConditionOp,
    /// Value to compare against.
    pub value: Value,
}

/// A finite boolean AND/OR tree of conditions.
///
/// Trees are acyclic by construction (owned children). `validate` rejects
/// branches with no children, which the remote service treats as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionTree {
    /// All children must match.
    And(Vec<ConditionTree>),
    /// At least one child must match.
    Or(Vec<ConditionTree>),
    /// A single comparison.
    Leaf(Condition),
}

impl ConditionTree {
    /// Convenience: `OR(AND(leaf))` around a single equality condition,
    /// the shape every simple one-field search uses.
    #[must_use]
    pub fn single_equals(name: &str, output: &str, value: impl Into<Value>) -> Self {
        Self::Or(vec![Self::And(vec![Self::Leaf(Condition {
            name: name.to_string(),
            output: output.to_string(),
            op: ConditionOp::Equals,
            value: value.into(),
        })])])
    }

    /// Check the tree invariants: every And/Or branch has at least one child.
    pub fn validate(&self) -> Result<(), QueryError> {
        match self {
            Self::And(children) | Self::Or(children) => {
                if children.is_empty() {
                    return Err(QueryError::InvalidCondition(
                        "empty AND/OR branch".to_string(),
                    ));
                }
                for child in children {
                    child.validate()?;
                }
                Ok(())
            }
            Self::Leaf(_) => Ok(()),
        }
    }

    /// Serialize to the wire shape the host-response service expects:
    /// `{"or": [...]}`, `{"and": [...]}`, and flat leaf objects.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::And(children) => {
                json!({ "and": children.iter().map(Self::to_wire).collect::<Vec<_>>() })
            }
            Self::Or(children) => {
                json!({ "or": children.iter().map(Self::to_wire).collect::<Vec<_>>() })
            }
            Self::Leaf(cond) => json!({
                "name": cond.name,
                "output": cond.output,
                "op": cond.op.as_wire(),
                "value": cond.value,
            }),
        }
    }
}

/// Sort direction for page requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// The token the wire protocol expects.
    #[must_use]
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A named operation with scalar parameters, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Operation id on the remote service.
    pub operation: String,
    /// String-keyed parameters.
    pub params: Map<String, Value>,
}

impl QueryRequest {
    /// Start building a request for an operation.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            params: Map::new(),
        }
    }

    /// Add a parameter. Consumes and returns the request so a built
    /// request is never mutated in place.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Split into the operation id and the params document the gateway
    /// sends on the wire.
    #[must_use]
    pub fn into_wire(self) -> (String, Value) {
        (self.operation, Value::Object(self.params))
    }
}

/// One page of search results: a read-only snapshot, not a live cursor.
///
/// `total` is the result count fixed when the search was created; it does
/// not change as pages are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    /// Start offset of this page within the result set.
    pub offset: usize,
    /// Page size that was requested (the page may hold fewer items).
    pub page_size: usize,
    /// Total result count known at query time.
    pub total: usize,
    /// The items in this page, in service sort order.
    pub items: Vec<Value>,
}

impl ResultPage {
    /// 1-based page number for display.
    #[must_use]
    pub fn page_number(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.offset / self.page_size + 1
    }
}
