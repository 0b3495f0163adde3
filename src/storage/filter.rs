//! Metadata where-filters for memory queries
//!
//! Accepts the operator syntax agents already use with vector stores:
//!
//! ```json
//! {
//!   "$and": [
//!     {"project": "memvault"},
//!     {"priority": {"$gte": 3}},
//!     {"$or": [
//!       {"status": {"$in": ["open", "triaged"]}},
//!       {"pinned": true}
//!     ]}
//!   ]
//! }
//! ```
//!
//! Filters are parsed into [`WhereFilter`] at the boundary so a malformed
//! filter fails before any store or model call, then compiled to a
//! parameterized SQL predicate over `json_extract(m.metadata, ...)`.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{MemvaultError, Result};
use crate::types::MetadataValue;

/// Parsed where-filter
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum WhereFilter {
    And(Vec<WhereFilter>),
    Or(Vec<WhereFilter>),
    Field { key: String, op: FilterOp },
}

/// Comparison applied to one metadata key
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(MetadataValue),
    Ne(MetadataValue),
    Gt(f64),
    Gte(f64),
    Lt(f64),
    Lte(f64),
    In(Vec<MetadataValue>),
    Nin(Vec<MetadataValue>),
}

fn invalid(message: impl Into<String>) -> MemvaultError {
    MemvaultError::InvalidArgument(message.into())
}

/// Metadata keys end up inside a SQL string literal, so only a safe
/// character set is accepted.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(invalid("Filter key cannot be empty"));
    }
    if key.starts_with('$') {
        return Err(invalid(format!("Unknown logical operator '{}'", key)));
    }
    if let Some(ch) = key
        .chars()
        .find(|ch| !ch.is_alphanumeric() && !matches!(ch, '_' | '-' | '.' | ' '))
    {
        return Err(invalid(format!(
            "Invalid character '{}' in filter key '{}'",
            ch, key
        )));
    }
    Ok(())
}

fn scalar(op: &str, value: &Value) -> Result<MetadataValue> {
    MetadataValue::from_json(value).ok_or_else(|| {
        invalid(format!(
            "'{}' requires a string, number or boolean, got {}",
            op, value
        ))
    })
}

fn number(op: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .ok_or_else(|| invalid(format!("'{}' requires a number, got {}", op, value)))
}

fn scalar_list(op: &str, value: &Value) -> Result<Vec<MetadataValue>> {
    value
        .as_array()
        .ok_or_else(|| invalid(format!("'{}' requires an array, got {}", op, value)))?
        .iter()
        .map(|v| scalar(op, v))
        .collect()
}

impl FilterOp {
    fn parse(value: &Value) -> Result<Vec<Self>> {
        let obj = match value {
            Value::Object(obj) => obj,
            // Bare scalar is shorthand for $eq
            other => return Ok(vec![FilterOp::Eq(scalar("$eq", other)?)]),
        };
        if obj.is_empty() {
            return Err(invalid("Operator object cannot be empty"));
        }

        obj.iter()
            .map(|(op, v)| match op.as_str() {
                "$eq" => Ok(FilterOp::Eq(scalar(op, v)?)),
                "$ne" => Ok(FilterOp::Ne(scalar(op, v)?)),
                "$gt" => Ok(FilterOp::Gt(number(op, v)?)),
                "$gte" => Ok(FilterOp::Gte(number(op, v)?)),
                "$lt" => Ok(FilterOp::Lt(number(op, v)?)),
                "$lte" => Ok(FilterOp::Lte(number(op, v)?)),
                "$in" => Ok(FilterOp::In(scalar_list(op, v)?)),
                "$nin" => Ok(FilterOp::Nin(scalar_list(op, v)?)),
                other => Err(invalid(format!(
                    "Unknown filter operator '{}'. Valid operators: $eq, $ne, $gt, $gte, $lt, $lte, $in, $nin",
                    other
                ))),
            })
            .collect()
    }
}

impl WhereFilter {
    /// Parse a JSON where-filter
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid(format!("Filter must be an object, got {}", value)))?;
        if obj.is_empty() {
            return Err(invalid("Filter object cannot be empty"));
        }

        let mut clauses = Vec::new();
        for (key, v) in obj {
            match key.as_str() {
                "$and" | "$or" => {
                    let items = v
                        .as_array()
                        .ok_or_else(|| invalid(format!("'{}' requires an array", key)))?;
                    if items.is_empty() {
                        return Err(invalid(format!("'{}' requires at least one clause", key)));
                    }
                    let parts = items
                        .iter()
                        .map(WhereFilter::from_json)
                        .collect::<Result<Vec<_>>>()?;
                    clauses.push(if key == "$and" {
                        WhereFilter::And(parts)
                    } else {
                        WhereFilter::Or(parts)
                    });
                }
                _ => {
                    validate_key(key)?;
                    for op in FilterOp::parse(v)? {
                        clauses.push(WhereFilter::Field {
                            key: key.clone(),
                            op,
                        });
                    }
                }
            }
        }

        // Several top-level keys are an implicit $and
        if clauses.len() == 1 {
            Ok(clauses.remove(0))
        } else {
            Ok(WhereFilter::And(clauses))
        }
    }

    /// Convenience for the common single-key equality filter
    pub fn eq(key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        WhereFilter::Field {
            key: key.into(),
            op: FilterOp::Eq(value.into()),
        }
    }
}

impl TryFrom<Value> for WhereFilter {
    type Error = MemvaultError;

    fn try_from(value: Value) -> Result<Self> {
        WhereFilter::from_json(&value)
    }
}

/// SQL generation context for building parameterized queries
pub struct SqlBuilder {
    params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Compile a filter into a predicate over the `m` alias
    pub fn build_filter(&mut self, filter: &WhereFilter) -> String {
        match filter {
            WhereFilter::And(parts) => self.join(parts, " AND "),
            WhereFilter::Or(parts) => self.join(parts, " OR "),
            WhereFilter::Field { key, op } => self.build_op(key, op),
        }
    }

    fn join(&mut self, parts: &[WhereFilter], sep: &str) -> String {
        let sql: Vec<String> = parts.iter().map(|p| self.build_filter(p)).collect();
        format!("({})", sql.join(sep))
    }

    fn build_op(&mut self, key: &str, op: &FilterOp) -> String {
        // Key validated at parse time; quoting keeps dots literal
        let path = format!("'$.\"{}\"'", key);
        let value = format!("json_extract(m.metadata, {})", path);
        let kind = format!("json_type(m.metadata, {})", path);

        match op {
            FilterOp::Eq(v) => self.typed_eq(&value, &kind, v),
            FilterOp::Ne(v) => {
                let eq = self.typed_eq(&value, &kind, v);
                format!("({} IS NOT NULL AND NOT {})", kind, eq)
            }
            FilterOp::Gt(n) => self.numeric(&value, &kind, ">", *n),
            FilterOp::Gte(n) => self.numeric(&value, &kind, ">=", *n),
            FilterOp::Lt(n) => self.numeric(&value, &kind, "<", *n),
            FilterOp::Lte(n) => self.numeric(&value, &kind, "<=", *n),
            FilterOp::In(values) => {
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let parts: Vec<String> = values
                    .iter()
                    .map(|v| self.typed_eq(&value, &kind, v))
                    .collect();
                format!("({})", parts.join(" OR "))
            }
            FilterOp::Nin(values) => {
                if values.is_empty() {
                    return format!("{} IS NOT NULL", kind);
                }
                let parts: Vec<String> = values
                    .iter()
                    .map(|v| self.typed_eq(&value, &kind, v))
                    .collect();
                format!("({} IS NOT NULL AND NOT ({}))", kind, parts.join(" OR "))
            }
        }
    }

    /// Equality that does not conflate `true` with `1` or `"1"` with `1`
    fn typed_eq(&mut self, value: &str, kind: &str, v: &MetadataValue) -> String {
        match v {
            MetadataValue::Bool(b) => {
                format!("{} = '{}'", kind, if *b { "true" } else { "false" })
            }
            MetadataValue::Int(i) => {
                self.params.push(Box::new(*i));
                format!("({} IN ('integer', 'real') AND {} = ?)", kind, value)
            }
            MetadataValue::Float(f) => {
                self.params.push(Box::new(*f));
                format!("({} IN ('integer', 'real') AND {} = ?)", kind, value)
            }
            MetadataValue::String(s) => {
                self.params.push(Box::new(s.clone()));
                format!("({} = 'text' AND {} = ?)", kind, value)
            }
        }
    }

    fn numeric(&mut self, value: &str, kind: &str, cmp: &str, n: f64) -> String {
        self.params.push(Box::new(n));
        format!("({} IN ('integer', 'real') AND {} {} ?)", kind, value, cmp)
    }

    /// Take the accumulated parameters
    pub fn take_params(&mut self) -> Vec<Box<dyn rusqlite::ToSql>> {
        std::mem::take(&mut self.params)
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new()
    }
}
