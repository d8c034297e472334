//! Dynamic value model for loosely-typed records
//!
//! Records carry runtime-tagged values rather than statically typed fields.
//! `Value` covers the primitive tags (text, number, boolean, symbol), the
//! built-in composites (list, map, date) and tagged instances of
//! user-defined classes.
//!
//! `Undefined` and `Null` are distinct: both fail every type match, but only
//! `Undefined` selects the zero-value path during coercion. `Null` is
//! converted like any other value (`"null"`, `0`, `false`).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Runtime type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Undefined,
    Null,
    Bool,
    Number,
    Text,
    Symbol,
    List,
    Map,
    Date,
    Instance,
}

/// A unique symbol value.
///
/// Every minted symbol carries a process-unique id; two symbols are equal
/// only if they are the same minting. The description is display-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    id: u64,
    description: Option<String>,
}

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

impl Symbol {
    /// Mints a fresh symbol with an optional description.
    pub fn new(description: Option<String>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    /// Returns the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

/// An instance of a user-defined class.
///
/// Instances are tagged with the exact class name their constructor minted.
/// Type matching compares that tag directly, so an instance of a derived
/// class never matches its ancestor's descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    class: String,
    payload: Box<Value>,
}

impl Instance {
    /// Creates an instance of `class` wrapping `payload`.
    pub fn new(class: impl Into<String>, payload: Value) -> Self {
        Self {
            class: class.into(),
            payload: Box::new(payload),
        }
    }

    /// The exact class name this instance was constructed with.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The constructor argument this instance was built from.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// A loosely-typed runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value; selects the zero-value path under coercion.
    Undefined,
    /// Explicit null; converted like any present value.
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Symbol(Symbol),
    List(Vec<Value>),
    /// Ordered key/value entries. Keys are arbitrary values.
    Map(Vec<(Value, Value)>),
    Date(DateTime<Utc>),
    Instance(Instance),
}

impl Value {
    /// Returns the runtime type tag.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Undefined => TypeTag::Undefined,
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Number(_) => TypeTag::Number,
            Value::Text(_) => TypeTag::Text,
            Value::Symbol(_) => TypeTag::Symbol,
            Value::List(_) => TypeTag::List,
            Value::Map(_) => TypeTag::Map,
            Value::Date(_) => TypeTag::Date,
            Value::Instance(_) => TypeTag::Instance,
        }
    }

    /// Returns the display name of the type that constructed this value,
    /// or `None` for `Undefined`/`Null` (which have no constructor).
    pub fn constructor_name(&self) -> Option<&str> {
        match self {
            Value::Undefined | Value::Null => None,
            Value::Bool(_) => Some("Boolean"),
            Value::Number(_) => Some("Number"),
            Value::Text(_) => Some("Text"),
            Value::Symbol(_) => Some("Symbol"),
            Value::List(_) => Some("List"),
            Value::Map(_) => Some("Map"),
            Value::Date(_) => Some("Date"),
            Value::Instance(i) => Some(i.class()),
        }
    }

    /// True for `Undefined` and `Null`.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Loose conversion to text, following platform primitive-conversion
    /// rules: `Null` becomes `"null"`, numbers drop a trailing `.0`,
    /// lists join their elements with commas.
    pub fn to_text(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Symbol(sym) => sym.to_string(),
            Value::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|v| if v.is_absent() { String::new() } else { v.to_text() })
                    .collect();
                parts.join(",")
            }
            Value::Map(_) => "[object Map]".to_string(),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Value::Instance(i) => format!("[object {}]", i.class()),
        }
    }

    /// Loose conversion to a number. Unconvertible input yields `NaN`,
    /// never an error. Empty text and `Null` convert to `0`; a
    /// single-element list converts as its element; dates convert to
    /// epoch milliseconds.
    ///
    /// Text accepts decimal and scientific notation plus the infinity and
    /// NaN spellings, case-insensitively. Radix-prefixed literals such as
    /// `0x1A` are not numbers here and convert to `NaN`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::List(items) => match items.len() {
                0 => 0.0,
                1 => items[0].to_number(),
                _ => f64::NAN,
            },
            Value::Date(d) => d.timestamp_millis() as f64,
            Value::Symbol(_) | Value::Map(_) | Value::Instance(_) => f64::NAN,
        }
    }

    /// Loose truthiness: `Undefined`, `Null`, `false`, `0`, `NaN` and empty
    /// text are falsy; every other value (including an empty list) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            _ => true,
        }
    }
}

/// Formats a number the loose way: integral values print without a
/// fractional part, non-finite values print as `NaN`/`Infinity`.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

/// A caller-supplied document: an insertion-ordered mapping from field name
/// to [`Value`].
///
/// Field order is significant: validation visits fields in the order the
/// caller inserted them and reports the first violation it finds. A field
/// holding `Undefined` is still *present* for presence checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields are present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when `name` exists in the record, regardless of value.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value for `name`, if present.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Inserts or replaces a field. Replacing keeps the field's original
    /// position; a new field appends.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.get_mut(&name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable iteration in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Builds a [`Record`] from `field => value` pairs, preserving order.
///
/// ```
/// use tenforce::{record, Value};
///
/// let r = record! {
///     "name" => "alice",
///     "age" => 30,
///     "note" => Value::Undefined,
/// };
/// assert_eq!(r.len(), 3);
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $( record.insert($name, $value); )+
        record
    }};
}
