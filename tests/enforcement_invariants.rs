//! Enforcement Invariant Tests
//!
//! Invariants exercised here:
//! - Validation is deterministic and never mutates the record
//! - The rule set and field index never change after construction
//! - A shared enforcer is safe for concurrent read-only callers
//! - Normalisation preserves record identity and field order

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use tenforce::{record, Schema, TypeDescriptor, TypeEnforcement, ValidateOptions, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_enforcer() -> TypeEnforcement {
    let mut rules = HashMap::new();
    rules.insert(
        "users".to_string(),
        Schema::new()
            .field("name", TypeDescriptor::Text)
            .field("age", TypeDescriptor::Number)
            .field("active", TypeDescriptor::Boolean),
    );
    TypeEnforcement::new(rules)
}

// =============================================================================
// Determinism Tests
// =============================================================================

/// The same record validates the same way every time.
#[test]
fn test_validation_is_deterministic() {
    let te = setup_enforcer();
    let record = record! { "name" => "Alice", "age" => 30, "active" => true };

    for _ in 0..100 {
        assert!(te
            .validate("users", &record, ValidateOptions::default())
            .is_ok());
    }
}

/// An invalid record fails consistently with the same error.
#[test]
fn test_invalid_record_fails_consistently() {
    let te = setup_enforcer();
    let record = record! { "name" => 1, "age" => 30, "active" => true };

    let first = te
        .validate("users", &record, ValidateOptions::default())
        .unwrap_err();
    for _ in 0..100 {
        let err = te
            .validate("users", &record, ValidateOptions::default())
            .unwrap_err();
        assert_eq!(err, first);
    }
}

/// Validation never mutates the record, pass or fail.
#[test]
fn test_validation_never_mutates() {
    let te = setup_enforcer();

    let valid = record! { "name" => "Alice", "age" => 30, "active" => true };
    let snapshot = valid.clone();
    let _ = te.validate("users", &valid, ValidateOptions::default());
    assert_eq!(valid, snapshot);

    let invalid = record! { "name" => Value::Null, "extra" => 1 };
    let snapshot = invalid.clone();
    let _ = te.validate("users", &invalid, ValidateOptions::default());
    assert_eq!(invalid, snapshot);
}

// =============================================================================
// Frozen Configuration Tests
// =============================================================================

/// The field index derived at construction stays equal to the schema's own
/// key set, in declaration order.
#[test]
fn test_field_index_stays_consistent() {
    let te = setup_enforcer();

    let expected = ["name", "age", "active"];
    assert_eq!(te.field_index("users").unwrap(), expected);

    // Run both operations, then re-check: per-call logic holds no state.
    let mut record = record! { "name" => Value::Undefined };
    let _ = te.validate("users", &record, ValidateOptions::skip_missing());
    let _ = te.normalise("users", &mut record);

    assert_eq!(te.field_index("users").unwrap(), expected);
    let names: Vec<&str> = te.rules()["users"].field_names().collect();
    assert_eq!(names, expected);
}

/// A shared enforcer serves concurrent read-only callers.
#[test]
fn test_concurrent_readonly_use() {
    let te = Arc::new(setup_enforcer());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let te = Arc::clone(&te);
            thread::spawn(move || {
                let mut record = record! {
                    "name" => Value::Undefined,
                    "age" => format!("{}", i),
                    "active" => 1,
                };
                te.normalise("users", &mut record).unwrap();
                assert_eq!(record.get("age"), Some(&Value::Number(i as f64)));
                assert!(te
                    .validate("users", &record, ValidateOptions::default())
                    .is_ok());
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

// =============================================================================
// Normalisation Identity Tests
// =============================================================================

/// Normalisation rewrites values in place without reordering fields.
#[test]
fn test_normalise_preserves_field_order() {
    let te = setup_enforcer();
    let mut record = record! {
        "active" => 0,
        "name" => 42,
        "age" => "7",
    };
    te.normalise("users", &mut record).unwrap();

    let keys: Vec<&str> = record.keys().collect();
    assert_eq!(keys, ["active", "name", "age"]);
    assert_eq!(record.get("active"), Some(&Value::Bool(false)));
    assert_eq!(record.get("name"), Some(&Value::Text("42".into())));
    assert_eq!(record.get("age"), Some(&Value::Number(7.0)));
}

/// Coercion re-derives values even when they already match; repeated
/// normalisation is stable only for idempotent constructors.
#[test]
fn test_repeated_normalisation_of_idempotent_types() {
    let te = setup_enforcer();
    let mut record = record! { "name" => "Alice", "age" => 30, "active" => true };

    te.normalise("users", &mut record).unwrap();
    let first = record.clone();
    te.normalise("users", &mut record).unwrap();
    assert_eq!(record, first);
}
