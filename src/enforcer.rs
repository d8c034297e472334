//! Schema enforcement: `validate` and `normalise`
//!
//! A [`TypeEnforcement`] holds a frozen set of named orders (schemas) plus a
//! per-order field index derived once at construction. It is stateless per
//! call: `validate` reports the first violation through its return value
//! without touching the record, `normalise` coerces every present field in
//! place and propagates violations with `?`.
//!
//! The rules are never copied and never mutable after construction: the
//! constructor takes ownership and only shared accessors exist.

use std::collections::HashMap;

use crate::descriptor::TypeDescriptor;
use crate::errors::{EnforceError, EnforceResult};
use crate::registry::TypeRegistry;
use crate::value::Record;

/// A single order: an ordered mapping from field name to declared type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, TypeDescriptor)>,
}

impl Schema {
    /// Creates a schema with no fields. An order with zero fields accepts
    /// exactly the empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Redeclaring a name replaces the earlier descriptor
    /// in place (last declaration wins).
    pub fn field(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = descriptor,
            None => self.fields.push((name, descriptor)),
        }
        self
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// Returns the declared descriptor for `name`.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, d)| d)
    }

    /// Declared field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

/// Options for [`TypeEnforcement::validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Skip the missing-fields check. Redundant-field and per-field type
    /// checks still apply.
    pub skip: bool,
}

impl ValidateOptions {
    /// Options with the missing-fields check skipped.
    pub fn skip_missing() -> Self {
        Self { skip: true }
    }
}

/// Runtime schema enforcer over a frozen set of named orders.
#[derive(Debug, Clone)]
pub struct TypeEnforcement {
    rules: HashMap<String, Schema>,
    index: HashMap<String, Vec<String>>,
}

impl TypeEnforcement {
    /// Creates an enforcer from typed rules.
    ///
    /// Ownership of `rules` transfers without copying; the field index per
    /// order is derived here, once, and both are immutable for the
    /// enforcer's lifetime. Malformed-definition failures cannot arise on
    /// this path — the types rule them out; see [`TypeEnforcement::from_value`]
    /// for the checked, loosely-typed construction path.
    pub fn new(rules: HashMap<String, Schema>) -> Self {
        let index = rules
            .iter()
            .map(|(order, schema)| {
                let names: Vec<String> = schema.field_names().map(String::from).collect();
                (order.clone(), names)
            })
            .collect();

        Self { rules, index }
    }

    /// Creates an enforcer from a loosely-typed declarative definition:
    /// a mapping of order name to a mapping of field name to constructor
    /// name, with names resolved through `registry`.
    ///
    /// # Errors
    ///
    /// Fails fast on a malformed definition:
    /// - `InvalidArgument` if the definition is not a mapping
    /// - `InvalidSchema` if an order's value is not a mapping
    /// - `MissingTypeDescriptor` if a field's descriptor is null
    /// - `InvalidTypeDescriptor` if a descriptor is not a registered
    ///   constructor name
    pub fn from_value(
        definition: &serde_json::Value,
        registry: &TypeRegistry,
    ) -> EnforceResult<Self> {
        let orders = definition.as_object().ok_or_else(|| {
            EnforceError::invalid_argument("schema definition must be a mapping of order names")
        })?;

        let mut rules = HashMap::with_capacity(orders.len());

        for (order, fields) in orders {
            let fields = fields
                .as_object()
                .ok_or_else(|| EnforceError::invalid_schema(order))?;

            let mut schema = Schema::new();
            for (field, descriptor) in fields {
                match descriptor {
                    serde_json::Value::Null => {
                        return Err(EnforceError::missing_type_descriptor(order, field));
                    }
                    serde_json::Value::String(name) => {
                        let resolved = registry.resolve(name).ok_or_else(|| {
                            EnforceError::invalid_type_descriptor(
                                order,
                                field,
                                format!("'{}' is not a registered constructor", name),
                            )
                        })?;
                        schema = schema.field(field, resolved.clone());
                    }
                    other => {
                        return Err(EnforceError::invalid_type_descriptor(
                            order,
                            field,
                            format!("expected a constructor name, got {}", other),
                        ));
                    }
                }
            }

            rules.insert(order.clone(), schema);
        }

        Ok(Self::new(rules))
    }

    /// Parses a JSON schema definition and builds the enforcer from it.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on malformed JSON, then everything
    /// [`TypeEnforcement::from_value`] can fail with.
    pub fn from_json(definition: &str, registry: &TypeRegistry) -> EnforceResult<Self> {
        let parsed: serde_json::Value = serde_json::from_str(definition).map_err(|e| {
            EnforceError::invalid_argument(format!("invalid schema definition JSON: {}", e))
        })?;
        Self::from_value(&parsed, registry)
    }

    /// The frozen rules, exactly as supplied at construction.
    pub fn rules(&self) -> &HashMap<String, Schema> {
        &self.rules
    }

    /// The cached field index for an order: its declared field names, in
    /// declaration order.
    pub fn field_index(&self, order: &str) -> Option<&[String]> {
        self.index.get(order).map(Vec::as_slice)
    }

    /// Checks `record` against the named order without mutating it.
    ///
    /// `Ok(())` is the success sentinel. Checks run in this sequence and
    /// stop at the first failure:
    ///
    /// 1. `UnknownOrder` — the order is not registered.
    /// 2. `MissingFields` — every declared field absent from the record,
    ///    listed together. Suppressed by `options.skip`.
    /// 3. `RedundantFields` — every record key the order does not declare,
    ///    listed together. Never suppressed.
    /// 4. `InvalidValue` — the first present field, in record key order,
    ///    whose value is not an instance of its declared type. Only the
    ///    first violation is reported.
    pub fn validate(
        &self,
        order: &str,
        record: &Record,
        options: ValidateOptions,
    ) -> EnforceResult<()> {
        let schema = self
            .rules
            .get(order)
            .ok_or_else(|| EnforceError::unknown_order(order))?;

        if !options.skip {
            let missing: Vec<String> = self.index[order]
                .iter()
                .filter(|name| !record.contains(name))
                .cloned()
                .collect();

            if !missing.is_empty() {
                return Err(EnforceError::missing_fields(order, missing));
            }
        }

        self.check_redundant(order, schema, record)?;

        for (name, value) in record.iter() {
            // Every key is declared at this point; the lookup still guards
            // rather than unwraps.
            let Some(descriptor) = schema.get(name) else {
                continue;
            };

            if !descriptor.matches(value) {
                return Err(EnforceError::invalid_value(
                    order,
                    name,
                    descriptor.display_name(),
                ));
            }
        }

        Ok(())
    }

    /// Coerces every field present in `record` to its declared type, in
    /// place, and returns the same record reference.
    ///
    /// Missing declared fields are not an error here: the coercion loop
    /// visits only keys present in the record, so absent fields stay
    /// absent, never defaulted. `UnknownOrder` and `RedundantFields` are
    /// checked before any mutation. A constructor failure mid-loop leaves
    /// the fields coerced so far mutated; the record must be considered
    /// unusable after an error.
    pub fn normalise<'r>(&self, order: &str, record: &'r mut Record) -> EnforceResult<&'r mut Record> {
        let schema = self
            .rules
            .get(order)
            .ok_or_else(|| EnforceError::unknown_order(order))?;

        self.check_redundant(order, schema, record)?;

        for (name, value) in record.iter_mut() {
            let Some(descriptor) = schema.get(name) else {
                continue;
            };

            *value = descriptor.coerce(value.clone())?;
        }

        Ok(record)
    }

    fn check_redundant(&self, order: &str, schema: &Schema, record: &Record) -> EnforceResult<()> {
        let redundant: Vec<String> = record
            .keys()
            .filter(|name| !schema.contains(name))
            .map(String::from)
            .collect();

        if redundant.is_empty() {
            Ok(())
        } else {
            Err(EnforceError::redundant_fields(order, redundant))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::record;
    use crate::value::Value;

    fn enforcer() -> TypeEnforcement {
        let mut rules = HashMap::new();
        rules.insert(
            "test".to_string(),
            Schema::new()
                .field("s", TypeDescriptor::Text)
                .field("n", TypeDescriptor::Number)
                .field("a", TypeDescriptor::list()),
        );
        TypeEnforcement::new(rules)
    }

    #[test]
    fn test_field_index_matches_declaration_order() {
        let te = enforcer();
        let index = te.field_index("test").unwrap();
        assert_eq!(index, ["s", "n", "a"]);
        assert!(te.field_index("unknown").is_none());
    }

    #[test]
    fn test_field_index_covers_schema_key_set() {
        let te = enforcer();
        let schema = &te.rules()["test"];
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(te.field_index("test").unwrap(), names.as_slice());
    }

    #[test]
    fn test_schema_redeclaration_replaces_in_place() {
        let schema = Schema::new()
            .field("x", TypeDescriptor::Text)
            .field("y", TypeDescriptor::Number)
            .field("x", TypeDescriptor::Boolean);

        assert_eq!(schema.len(), 2);
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(names, ["x", "y"]);
        assert!(matches!(schema.get("x"), Some(TypeDescriptor::Boolean)));
    }

    #[test]
    fn test_unknown_order() {
        let te = enforcer();
        let err = te
            .validate("unknown", &record! {}, ValidateOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownOrder);

        let err = te.normalise("unknown", &mut record! {}).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownOrder);
    }

    #[test]
    fn test_zero_field_order_accepts_empty_record() {
        let mut rules = HashMap::new();
        rules.insert("test".to_string(), Schema::new());
        let te = TypeEnforcement::new(rules);

        assert!(te
            .validate("test", &record! {}, ValidateOptions::default())
            .is_ok());

        let mut record = record! {};
        let normalised = te.normalise("test", &mut record).unwrap();
        assert!(normalised.is_empty());
    }

    #[test]
    fn test_missing_fields_listed_together() {
        let te = enforcer();
        let err = te
            .validate("test", &record! { "s" => "" }, ValidateOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            EnforceError::missing_fields("test", vec!["n".into(), "a".into()])
        );
    }

    #[test]
    fn test_skip_suppresses_missing_but_not_redundant() {
        let te = enforcer();

        assert!(te
            .validate("test", &record! { "s" => "" }, ValidateOptions::skip_missing())
            .is_ok());

        let err = te
            .validate(
                "test",
                &record! { "s" => "", "u" => 1 },
                ValidateOptions::skip_missing(),
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RedundantFields);
    }

    #[test]
    fn test_validate_short_circuits_on_first_invalid_field() {
        let te = enforcer();
        // Both s and n are wrong; record key order decides which is named.
        let record = record! {
            "n" => "not a number",
            "s" => 1,
            "a" => Value::List(vec![]),
        };
        let err = te
            .validate("test", &record, ValidateOptions::default())
            .unwrap_err();
        assert_eq!(err, EnforceError::invalid_value("test", "n", "Number"));
    }

    #[test]
    fn test_validate_does_not_mutate() {
        let te = enforcer();
        let record = record! { "s" => Value::Null, "n" => 1, "a" => Value::List(vec![]) };
        let before = record.clone();
        let _ = te.validate("test", &record, ValidateOptions::default());
        assert_eq!(record, before);
    }

    #[test]
    fn test_normalise_ignores_missing_fields() {
        let te = enforcer();
        let mut record = record! { "n" => "1" };
        te.normalise("test", &mut record).unwrap();

        assert_eq!(record.len(), 1);
        assert!(!record.contains("s"));
        assert_eq!(record.get("n"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_normalise_rejects_redundant_before_mutating() {
        let te = enforcer();
        let mut record = record! { "s" => 1, "u" => "redundant" };
        let before = record.clone();

        let err = te.normalise("test", &mut record).unwrap_err();
        assert_eq!(
            err,
            EnforceError::redundant_fields("test", vec!["u".into()])
        );
        assert_eq!(record, before);
    }

    #[test]
    fn test_normalise_returns_same_record() {
        let te = enforcer();
        let mut record = record! { "s" => "ok" };
        let ptr = &record as *const Record;
        let normalised = te.normalise("test", &mut record).unwrap();
        assert_eq!(normalised as *const Record, ptr);
    }

    #[test]
    fn test_from_value_construction_failures() {
        let registry = TypeRegistry::new();

        let err =
            TypeEnforcement::from_value(&serde_json::json!(null), &registry).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let err =
            TypeEnforcement::from_value(&serde_json::json!({"test": 1}), &registry).unwrap_err();
        assert_eq!(err, EnforceError::invalid_schema("test"));

        let err = TypeEnforcement::from_value(
            &serde_json::json!({"test": {"foo": null}}),
            &registry,
        )
        .unwrap_err();
        assert_eq!(err, EnforceError::missing_type_descriptor("test", "foo"));

        let err = TypeEnforcement::from_value(
            &serde_json::json!({"test": {"foo": "NoSuchType"}}),
            &registry,
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTypeDescriptor);

        let err = TypeEnforcement::from_value(
            &serde_json::json!({"test": {"foo": 42}}),
            &registry,
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTypeDescriptor);
    }

    #[test]
    fn test_from_json_round_trip() {
        let mut registry = TypeRegistry::new();
        registry.register(TypeDescriptor::class("Account"));

        let te = TypeEnforcement::from_json(
            r#"{"open": {"owner": "Text", "balance": "Number", "account": "Account"}}"#,
            &registry,
        )
        .unwrap();

        let index = te.field_index("open").unwrap();
        assert_eq!(index, ["owner", "balance", "account"]);

        let mut record = record! {
            "owner" => Value::Undefined,
            "balance" => "12.5",
            "account" => Value::Undefined,
        };
        te.normalise("open", &mut record).unwrap();
        assert_eq!(record.get("owner"), Some(&Value::Text(String::new())));
        assert_eq!(record.get("balance"), Some(&Value::Number(12.5)));
        assert_eq!(record.get("account").unwrap().constructor_name(), Some("Account"));

        assert!(TypeEnforcement::from_json("not json", &registry).is_err());
    }
}
