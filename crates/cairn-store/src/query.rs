//! Collection queries: equality filters, ordering, pagination.
//!
//! [`Query`] is a backend-neutral description of "which records, in which
//! order, which page". [`Query::matches`] and [`Query::apply`] give the
//! reference semantics that every backend must reproduce.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cairn_types::{ObjType, ObjectId, Record};

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Asc,
    Desc,
}

/// Equality constraint on one field.
///
/// A `null` value matches records where the field is missing or null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// Ordering on one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

/// 1-based page selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// A filtered, ordered, optionally paginated query over one model type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub obj_type: ObjType,
    pub filters: Vec<Filter>,
    pub orders: Vec<Order>,
    pub pagination: Option<Pagination>,
}

impl Query {
    /// Match every record of `obj_type`.
    pub fn new(obj_type: impl Into<ObjType>) -> Self {
        Self {
            obj_type: obj_type.into(),
            filters: Vec::new(),
            orders: Vec::new(),
            pagination: None,
        }
    }

    /// Add an equality filter.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Add a sort key. Keys apply in the order they were added.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(Order {
            field: field.into(),
            direction,
        });
        self
    }

    /// Restrict to one page of `per_page` results (`page` starts at 1).
    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }

    /// Copy of this query without pagination (used for counting).
    pub fn unpaginated(&self) -> Self {
        Self {
            pagination: None,
            ..self.clone()
        }
    }

    /// Whether `record` satisfies the type tag and every filter.
    pub fn matches(&self, record: &Record) -> bool {
        record.obj_type == self.obj_type
            && self
                .filters
                .iter()
                .all(|f| values_match(record.value_of(&f.field).as_ref(), &f.value))
    }

    /// Filter, sort, and paginate `records` according to this query.
    ///
    /// Sorting is stable: records that compare equal keep their input order.
    pub fn apply(&self, records: impl IntoIterator<Item = Record>) -> Vec<Record> {
        let mut matched: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();

        if !self.orders.is_empty() {
            matched.sort_by(|a, b| {
                for order in &self.orders {
                    let ord = compare_values(
                        a.value_of(&order.field).as_ref(),
                        b.value_of(&order.field).as_ref(),
                    );
                    let ord = match order.direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        match self.pagination {
            Some(p) => matched.into_iter().skip(p.offset()).take(p.per_page).collect(),
            None => matched,
        }
    }
}

/// Loose equality used by filters.
///
/// Identity-like scalars compare by normalized identity so that `"42"`
/// matches `42`.
fn values_match(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None, Value::Null) => true,
        (None, _) => false,
        (Some(a), e) if a == e => true,
        (Some(a), e) => match (ObjectId::from_value(a), ObjectId::from_value(e)) {
            (Ok(Some(x)), Ok(Some(y))) => x == y,
            _ => false,
        },
    }
}

/// Total order over optional JSON values. Missing values sort first.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => {
            // Timestamps compare as instants regardless of textual precision.
            match (
                chrono::DateTime::parse_from_rfc3339(x),
                chrono::DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        _ => a.to_string().cmp(&b.to_string()),
    }
}
