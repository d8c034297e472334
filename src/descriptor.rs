//! Type descriptors: identity testing and coercion
//!
//! A [`TypeDescriptor`] names the type a field is expected to hold. The
//! primitive wrappers (`Text`, `Number`, `Boolean`, `Symbol`) match by
//! runtime tag and coerce by loose conversion. Everything else is a
//! [`Constructor`]: a named identity with a factory function, covering the
//! built-in composites (`List`, `Map`, `Date`) and user-defined classes.
//!
//! Matching is exact. Constructible matching compares the value's own
//! constructor identity against the descriptor's name; an instance of a
//! derived class does not match its ancestor's descriptor.
//!
//! Coercion never inspects whether the current value already satisfies the
//! type. It always derives a new value, so it is a no-op only for
//! constructors idempotent on their own instances (`Date` from a `Date`).

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::errors::{EnforceError, EnforceResult};
use crate::value::{Instance, Symbol, TypeTag, Value};

/// Factory signature for constructible types.
///
/// `None` means the input value was absent and the constructor runs with no
/// argument; `Some` passes the raw value through. A factory may fail; the
/// failure propagates unmodified out of `normalise`.
pub type Factory = Arc<dyn Fn(Option<Value>) -> EnforceResult<Value> + Send + Sync>;

/// A named constructible identity with its factory.
///
/// The name IS the identity: matching compares names, so two constructors
/// registered under the same name are indistinguishable and accept each
/// other's instances. Keep class names unique per enforcer.
#[derive(Clone)]
pub struct Constructor {
    name: String,
    factory: Factory,
}

impl Constructor {
    /// Creates a constructor with the given display name and factory.
    pub fn new(name: impl Into<String>, factory: Factory) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }

    /// The display name, used in error messages and identity matching.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the factory.
    pub fn construct(&self, value: Option<Value>) -> EnforceResult<Value> {
        (self.factory)(value)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The declared type of a schema field.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// Primitive text wrapper.
    Text,
    /// Primitive numeric wrapper.
    Number,
    /// Primitive boolean wrapper.
    Boolean,
    /// Primitive symbol wrapper; coercion always mints a fresh symbol.
    Symbol,
    /// Any constructible identity: built-in composite or user class.
    Constructible(Constructor),
}

impl TypeDescriptor {
    /// The built-in `List` identity.
    ///
    /// Construction semantics: no argument gives an empty list; a single
    /// non-negative integral number no larger than the platform list
    /// maximum (2^32 - 1) sets the length (slots hold `Undefined`); any
    /// other single value becomes the sole element.
    pub fn list() -> Self {
        TypeDescriptor::Constructible(Constructor::new(
            "List",
            Arc::new(|value| match value {
                None => Ok(Value::List(Vec::new())),
                Some(Value::Number(n)) => {
                    if n < 0.0 || n != n.trunc() || !n.is_finite() || n > u32::MAX as f64 {
                        return Err(EnforceError::invalid_argument(format!(
                            "invalid list length {}",
                            Value::Number(n).to_text()
                        )));
                    }
                    Ok(Value::List(vec![Value::Undefined; n as usize]))
                }
                Some(other) => Ok(Value::List(vec![other])),
            }),
        ))
    }

    /// The built-in `Map` identity.
    ///
    /// Construction semantics: no argument or `Null` gives an empty map; a
    /// list of two-element pair lists or an existing map supplies the
    /// entries; anything else is not iterable and fails.
    pub fn map() -> Self {
        TypeDescriptor::Constructible(Constructor::new(
            "Map",
            Arc::new(|value| match value {
                None | Some(Value::Null) => Ok(Value::Map(Vec::new())),
                Some(Value::Map(entries)) => Ok(Value::Map(entries)),
                Some(Value::List(items)) => {
                    let mut entries = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::List(mut pair) if pair.len() == 2 => {
                                let value = pair.pop().unwrap_or(Value::Undefined);
                                let key = pair.pop().unwrap_or(Value::Undefined);
                                entries.push((key, value));
                            }
                            other => {
                                return Err(EnforceError::invalid_argument(format!(
                                    "map entry '{}' is not a key/value pair",
                                    other.to_text()
                                )))
                            }
                        }
                    }
                    Ok(Value::Map(entries))
                }
                Some(other) => Err(EnforceError::invalid_argument(format!(
                    "value '{}' is not iterable",
                    other.to_text()
                ))),
            }),
        ))
    }

    /// The built-in `Date` identity.
    ///
    /// Construction semantics: no argument gives the current instant; an
    /// existing date passes through unchanged; a number is epoch
    /// milliseconds; text is parsed as RFC 3339 or `YYYY-MM-DD`.
    pub fn date() -> Self {
        TypeDescriptor::Constructible(Constructor::new(
            "Date",
            Arc::new(|value| match value {
                None => Ok(Value::Date(Utc::now())),
                Some(Value::Date(d)) => Ok(Value::Date(d)),
                Some(Value::Text(s)) => parse_date(&s)
                    .map(Value::Date)
                    .ok_or_else(|| {
                        EnforceError::invalid_argument(format!("unparseable date '{}'", s))
                    }),
                Some(other) => {
                    let millis = other.to_number();
                    date_from_millis(millis).map(Value::Date).ok_or_else(|| {
                        EnforceError::invalid_argument(format!(
                            "invalid date value '{}'",
                            other.to_text()
                        ))
                    })
                }
            }),
        ))
    }

    /// A user-defined class identity with the default factory: instances
    /// tag the class name and keep the raw constructor argument as payload.
    pub fn class(name: impl Into<String>) -> Self {
        let name = name.into();
        let tag = name.clone();
        TypeDescriptor::Constructible(Constructor::new(
            name,
            Arc::new(move |value| {
                Ok(Value::Instance(Instance::new(
                    tag.clone(),
                    value.unwrap_or(Value::Undefined),
                )))
            }),
        ))
    }

    /// A user-defined class identity with a custom factory.
    pub fn class_with(name: impl Into<String>, factory: Factory) -> Self {
        TypeDescriptor::Constructible(Constructor::new(name, factory))
    }

    /// The display name used in error messages.
    pub fn display_name(&self) -> &str {
        match self {
            TypeDescriptor::Text => "Text",
            TypeDescriptor::Number => "Number",
            TypeDescriptor::Boolean => "Boolean",
            TypeDescriptor::Symbol => "Symbol",
            TypeDescriptor::Constructible(c) => c.name(),
        }
    }

    /// Tests whether `value` is an instance of this type.
    ///
    /// `Undefined` and `Null` match nothing. Primitive wrappers compare the
    /// value's runtime tag; constructibles compare the value's own
    /// constructor identity against the descriptor's name, with no
    /// ancestor walk.
    pub fn matches(&self, value: &Value) -> bool {
        if value.is_absent() {
            return false;
        }

        match self {
            TypeDescriptor::Text => value.tag() == TypeTag::Text,
            TypeDescriptor::Number => value.tag() == TypeTag::Number,
            TypeDescriptor::Boolean => value.tag() == TypeTag::Bool,
            TypeDescriptor::Symbol => value.tag() == TypeTag::Symbol,
            TypeDescriptor::Constructible(c) => value.constructor_name() == Some(c.name()),
        }
    }

    /// Derives a new value of this type from `value`.
    ///
    /// Primitive wrappers convert loosely: `Undefined` produces the zero
    /// value (empty text, `0`, `false`, a fresh symbol), anything else is
    /// converted in place of inspection — an unconvertible numeric input
    /// yields `NaN`, not an error. Constructibles run their factory with
    /// no argument (`Undefined` input) or the raw value.
    pub fn coerce(&self, value: Value) -> EnforceResult<Value> {
        let absent = matches!(value, Value::Undefined);

        match self {
            TypeDescriptor::Text => Ok(Value::Text(if absent {
                String::new()
            } else {
                value.to_text()
            })),
            TypeDescriptor::Number => Ok(Value::Number(if absent {
                0.0
            } else {
                value.to_number()
            })),
            TypeDescriptor::Boolean => Ok(Value::Bool(if absent {
                false
            } else {
                value.is_truthy()
            })),
            TypeDescriptor::Symbol => Ok(Value::Symbol(if absent {
                Symbol::new(None)
            } else {
                Symbol::new(Some(value.to_text()))
            })),
            TypeDescriptor::Constructible(c) => {
                c.construct(if absent { None } else { Some(value) })
            }
        }
    }
}

/// Parses RFC 3339 first, then a bare `YYYY-MM-DD` at midnight UTC.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

fn date_from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}
