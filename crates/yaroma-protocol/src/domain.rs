//! Domain filter expressions.
//!
//! A domain is the server's search filter: a flat list in prefix (Polish)
//! notation where each element is either a term `[field, operator, value]`
//! or one of the logical operators `"&"`, `"|"`, `"!"`. Consecutive
//! top-level expressions are implicitly AND-ed.
//!
//! ```text
//! [["sale_ok", "=", true], "|", ["name", "ilike", "rose"], ["default_code", "ilike", "rose"]]
//!   sale_ok = true AND (name ilike rose OR default_code ilike rose)
//! ```
//!
//! [`Domain::matches`] evaluates a domain against a record locally, with
//! the same semantics the server applies for the operators listed in
//! [`Operator`]. Fake servers in tests use it to answer searches.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Comparison operator of a domain term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Case-sensitive substring match.
    Like,
    /// Case-insensitive substring match.
    ILike,
    In,
    NotIn,
}

impl Operator {
    /// The wire spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "like",
            Self::ILike => "ilike",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }

    /// Parses the wire spelling. Returns `None` for operators this
    /// client doesn't model (`child_of`, `=like`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        let op = match s {
            "=" | "==" => Self::Eq,
            "!=" | "<>" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "like" => Self::Like,
            "ilike" => Self::ILike,
            "in" => Self::In,
            "not in" => Self::NotIn,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Term / DomainItem
// ---------------------------------------------------------------------------

/// A single `[field, operator, value]` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

/// One element of a domain list.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainItem {
    /// `"&"` — AND of the next two expressions.
    And,
    /// `"|"` — OR of the next two expressions.
    Or,
    /// `"!"` — negation of the next expression.
    Not,
    Term(Term),
}

impl DomainItem {
    fn to_value(&self) -> Value {
        match self {
            Self::And => Value::from("&"),
            Self::Or => Value::from("|"),
            Self::Not => Value::from("!"),
            Self::Term(t) => Value::Array(vec![
                Value::from(t.field.clone()),
                Value::from(t.operator.as_str()),
                t.value.clone(),
            ]),
        }
    }

    fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        match value {
            Value::String(s) => match s.as_str() {
                "&" => Ok(Self::And),
                "|" => Ok(Self::Or),
                "!" => Ok(Self::Not),
                other => Err(ProtocolError::InvalidDomain(format!(
                    "unknown logical operator {other:?}"
                ))),
            },
            Value::Array(parts) if parts.len() == 3 => {
                let field = parts[0].as_str().ok_or_else(|| {
                    ProtocolError::InvalidDomain(format!(
                        "term field must be a string, got {}",
                        parts[0]
                    ))
                })?;
                let op = parts[1].as_str().and_then(Operator::parse).ok_or_else(|| {
                    ProtocolError::InvalidDomain(format!(
                        "unsupported operator {}",
                        parts[1]
                    ))
                })?;
                Ok(Self::Term(Term {
                    field: field.to_string(),
                    operator: op,
                    value: parts[2].clone(),
                }))
            }
            other => Err(ProtocolError::InvalidDomain(format!(
                "expected a term or logical operator, got {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// A search filter in prefix notation. The empty domain matches every
/// record.
///
/// ```rust
/// use yaroma_protocol::{Domain, Operator};
///
/// let low_stock = Domain::new()
///     .term("qty_available", Operator::Le, 10)
///     .term("qty_available", Operator::Gt, 0);
///
/// assert!(low_stock.matches(&serde_json::json!({"qty_available": 10})).unwrap());
/// assert!(!low_stock.matches(&serde_json::json!({"qty_available": 0})).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Domain {
    items: Vec<DomainItem>,
}

impl Domain {
    /// The empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `[field, operator, value]` term.
    pub fn term(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.items.push(DomainItem::Term(Term {
            field: field.into(),
            operator,
            value: value.into(),
        }));
        self
    }

    /// Appends `"|"`: the next two expressions are OR-ed.
    pub fn or(mut self) -> Self {
        self.items.push(DomainItem::Or);
        self
    }

    /// Appends `"&"`: the next two expressions are AND-ed explicitly.
    pub fn and(mut self) -> Self {
        self.items.push(DomainItem::And);
        self
    }

    /// Appends `"!"`: the next expression is negated.
    pub fn negate(mut self) -> Self {
        self.items.push(DomainItem::Not);
        self
    }

    /// Appends every item of `other` (implicit AND at top level).
    pub fn extend(mut self, other: Domain) -> Self {
        self.items.extend(other.items);
        self
    }

    pub fn items(&self) -> &[DomainItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The wire form: a JSON array.
    pub fn to_value(&self) -> Value {
        Value::Array(self.items.iter().map(DomainItem::to_value).collect())
    }

    /// Parses the wire form.
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let items = value.as_array().ok_or_else(|| {
            ProtocolError::InvalidDomain(format!("domain must be an array, got {value}"))
        })?;
        let items = items
            .iter()
            .map(DomainItem::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { items })
    }

    /// Evaluates the domain against a record (a JSON object as returned
    /// by `read`/`search_read`).
    ///
    /// Missing fields read as `null`. Many2one values (`[id, "name"]`)
    /// compare by id.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidDomain`] if a logical operator is missing
    /// an operand.
    pub fn matches(&self, record: &Value) -> Result<bool, ProtocolError> {
        let mut iter = self.items.iter();
        let mut exprs = Vec::new();
        while iter.len() > 0 {
            exprs.push(Expr::parse(&mut iter)?);
        }
        Ok(exprs.iter().all(|e| e.eval(record)))
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter().map(DomainItem::to_value))
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Domain::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl From<Domain> for Value {
    fn from(domain: Domain) -> Self {
        domain.to_value()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A domain parsed into a tree.
enum Expr<'a> {
    Leaf(&'a Term),
    And(Box<Expr<'a>>, Box<Expr<'a>>),
    Or(Box<Expr<'a>>, Box<Expr<'a>>),
    Not(Box<Expr<'a>>),
}

impl<'a> Expr<'a> {
    fn parse(
        items: &mut std::slice::Iter<'a, DomainItem>,
    ) -> Result<Self, ProtocolError> {
        let item = items.next().ok_or_else(|| {
            ProtocolError::InvalidDomain("logical operator is missing an operand".into())
        })?;
        Ok(match item {
            DomainItem::Term(t) => Expr::Leaf(t),
            DomainItem::Not => Expr::Not(Box::new(Self::parse(items)?)),
            DomainItem::And => {
                let lhs = Self::parse(items)?;
                Expr::And(Box::new(lhs), Box::new(Self::parse(items)?))
            }
            DomainItem::Or => {
                let lhs = Self::parse(items)?;
                Expr::Or(Box::new(lhs), Box::new(Self::parse(items)?))
            }
        })
    }

    fn eval(&self, record: &Value) -> bool {
        match self {
            Expr::Leaf(t) => eval_term(t, record),
            Expr::And(a, b) => a.eval(record) && b.eval(record),
            Expr::Or(a, b) => a.eval(record) || b.eval(record),
            Expr::Not(e) => !e.eval(record),
        }
    }
}

static NULL: Value = Value::Null;

fn eval_term(term: &Term, record: &Value) -> bool {
    let actual = many2one_id(record.get(&term.field).unwrap_or(&NULL));
    let expected = &term.value;

    match term.operator {
        Operator::Eq => loosely_equal(actual, expected),
        Operator::Ne => !loosely_equal(actual, expected),
        Operator::Lt => compare(actual, expected) == Some(Ordering::Less),
        Operator::Le => matches!(
            compare(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Gt => compare(actual, expected) == Some(Ordering::Greater),
        Operator::Ge => matches!(
            compare(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Like => contains(actual, expected, false),
        Operator::ILike => contains(actual, expected, true),
        Operator::In => in_list(actual, expected),
        Operator::NotIn => !in_list(actual, expected),
    }
}

/// `[42, "Drinks"]` → `42`; anything else unchanged.
fn many2one_id(value: &Value) -> &Value {
    match value {
        Value::Array(pair) if pair.len() == 2 && pair[0].is_i64() && pair[1].is_string() => {
            &pair[0]
        }
        other => other,
    }
}

/// Numbers compare numerically (`1 == 1.0`); `false` and `null` are the
/// same "unset" value.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => match (a, b) {
            (Value::Null, Value::Bool(false)) | (Value::Bool(false), Value::Null) => true,
            _ => a == b,
        },
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn contains(haystack: &Value, needle: &Value, case_insensitive: bool) -> bool {
    let (Some(h), Some(n)) = (haystack.as_str(), needle.as_str()) else {
        return false;
    };
    if case_insensitive {
        h.to_lowercase().contains(&n.to_lowercase())
    } else {
        h.contains(n)
    }
}

fn in_list(actual: &Value, list: &Value) -> bool {
    list.as_array()
        .is_some_and(|values| values.iter().any(|v| loosely_equal(actual, v)))
}
