//! tenforce - runtime schema enforcement for loosely-typed records
//!
//! A set of named orders (schemas) maps field names to expected type
//! identities. Two operations run against an order and a caller-supplied
//! record:
//!
//! - [`TypeEnforcement::validate`] reports mismatches without mutating the
//!   record; `Ok(())` is the success sentinel.
//! - [`TypeEnforcement::normalise`] coerces every present field to its
//!   declared type in place and returns the same record reference;
//!   violations propagate as errors.
//!
//! The rule set is frozen at construction and never mutated afterwards, so
//! a single enforcer is safe to share across read-only callers. Everything
//! is synchronous and performs no I/O.
//!
//! ```
//! use std::collections::HashMap;
//! use tenforce::{record, Schema, TypeDescriptor, TypeEnforcement, ValidateOptions, Value};
//!
//! let mut rules = HashMap::new();
//! rules.insert(
//!     "sale".to_string(),
//!     Schema::new()
//!         .field("item", TypeDescriptor::Text)
//!         .field("qty", TypeDescriptor::Number),
//! );
//! let te = TypeEnforcement::new(rules);
//!
//! let mut order = record! { "item" => "tea", "qty" => "3" };
//! assert!(te.validate("sale", &order, ValidateOptions::default()).is_err());
//!
//! te.normalise("sale", &mut order).unwrap();
//! assert_eq!(order.get("qty"), Some(&Value::Number(3.0)));
//! assert!(te.validate("sale", &order, ValidateOptions::default()).is_ok());
//! ```

pub mod descriptor;
pub mod enforcer;
pub mod errors;
pub mod registry;
pub mod value;

pub use descriptor::{Constructor, Factory, TypeDescriptor};
pub use enforcer::{Schema, TypeEnforcement, ValidateOptions};
pub use errors::{EnforceError, EnforceResult, ErrorCode};
pub use registry::TypeRegistry;
pub use value::{Instance, Record, Symbol, TypeTag, Value};
