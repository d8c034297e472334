//! Constructor name registry
//!
//! Declarative schema definitions refer to types by name. The registry
//! resolves those names to [`TypeDescriptor`]s. The built-in identities are
//! pre-registered; user classes are added with [`TypeRegistry::register`].

use std::collections::HashMap;

use crate::descriptor::TypeDescriptor;

/// Resolves type-descriptor names for declarative schema construction.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    constructors: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Creates a registry pre-loaded with the built-in identities:
    /// `Text`, `Number`, `Boolean`, `Symbol`, `List`, `Map`, `Date`.
    pub fn new() -> Self {
        let mut registry = Self {
            constructors: HashMap::new(),
        };

        registry.insert(TypeDescriptor::Text);
        registry.insert(TypeDescriptor::Number);
        registry.insert(TypeDescriptor::Boolean);
        registry.insert(TypeDescriptor::Symbol);
        registry.insert(TypeDescriptor::list());
        registry.insert(TypeDescriptor::map());
        registry.insert(TypeDescriptor::date());

        registry
    }

    /// Registers a descriptor under its own display name. Re-registering a
    /// name replaces the previous descriptor.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.insert(descriptor);
        self
    }

    /// Resolves a name to its descriptor.
    pub fn resolve(&self, name: &str) -> Option<&TypeDescriptor> {
        self.constructors.get(name)
    }

    /// True when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    fn insert(&mut self, descriptor: TypeDescriptor) {
        self.constructors
            .insert(descriptor.display_name().to_string(), descriptor);
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
