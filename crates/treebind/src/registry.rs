//! [`SchemaRegistry`] — the schema resolver and its process-wide cache.
//!
//! Registration is an upfront, mutable step; resolution is a pure function
//! of the registered specs and is memoized behind an `RwLock`. Races on the
//! memo map are harmless: resolution is deterministic, so a lost update
//! merely recomputes the same schema.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::schema::{
    ConstructorSpec, EnumSpec, FieldDescriptor, ParamTag, SchemaError, TypeSchema, TypeSpec,
};
use crate::shape::classify;

/// Holds all registered type and enum specs, and resolves them to
/// [`TypeSchema`]s on demand.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, TypeSpec>,
    enums: HashMap<String, EnumSpec>,
    resolved: RwLock<HashMap<String, Arc<TypeSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec-enabled type. Replaces any previous spec of the
    /// same name and drops its memoized schema.
    pub fn register(&mut self, spec: TypeSpec) {
        if let Ok(mut resolved) = self.resolved.write() {
            resolved.remove(&spec.name);
        }
        self.types.insert(spec.name.clone(), spec);
    }

    /// Register an enumeration.
    pub fn register_enum(&mut self, spec: EnumSpec) {
        self.enums.insert(spec.name.clone(), spec);
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn has_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn enum_spec(&self, name: &str) -> Option<&EnumSpec> {
        self.enums.get(name)
    }

    /// Resolve a type name to its metadata model.
    ///
    /// Selects the single marked codec constructor, classifies every
    /// parameter and checks tree-key uniqueness — all before any value is
    /// touched. The result is memoized.
    pub fn resolve(&self, name: &str) -> Result<Arc<TypeSchema>, SchemaError> {
        if let Ok(resolved) = self.resolved.read() {
            if let Some(schema) = resolved.get(name) {
                return Ok(schema.clone());
            }
        }

        let spec = self
            .types
            .get(name)
            .ok_or_else(|| SchemaError::UnsupportedType {
                name: name.to_string(),
            })?;
        let schema = Arc::new(self.build_schema(spec)?);

        if let Ok(mut resolved) = self.resolved.write() {
            // First writer wins; a concurrent resolve produced the same schema.
            resolved
                .entry(name.to_string())
                .or_insert_with(|| schema.clone());
        }
        Ok(schema)
    }

    fn select_constructor<'a>(&self, spec: &'a TypeSpec) -> Result<&'a ConstructorSpec, SchemaError> {
        let mut marked = spec.constructors.iter().filter(|c| c.codec);
        let first = marked.next().ok_or_else(|| SchemaError::NoCodecConstructor {
            type_name: spec.name.clone(),
        })?;
        let extra = marked.count();
        if extra > 0 {
            return Err(SchemaError::AmbiguousCodecConstructor {
                type_name: spec.name.clone(),
                count: extra + 1,
            });
        }
        Ok(first)
    }

    fn build_schema(&self, spec: &TypeSpec) -> Result<TypeSchema, SchemaError> {
        let constructor = self.select_constructor(spec)?;

        let mut fields = Vec::with_capacity(constructor.params.len());
        let mut seen_keys: HashSet<String> = HashSet::new();
        for param in &constructor.params {
            let tag = param.tag.as_ref().ok_or_else(|| SchemaError::MissingFieldTag {
                type_name: spec.name.clone(),
                param: param.name.clone(),
            })?;
            let shape = classify(&param.ty, self)?;
            let descriptor = match tag {
                ParamTag::Field { alias, nullable } => {
                    let key = alias.clone().unwrap_or_else(|| param.name.clone());
                    FieldDescriptor {
                        name: param.name.clone(),
                        key,
                        nullable: *nullable,
                        implicit: None,
                        shape,
                    }
                }
                ParamTag::Implicit { key } => FieldDescriptor {
                    name: param.name.clone(),
                    key: param.name.clone(),
                    nullable: false,
                    implicit: Some(key.clone()),
                    shape,
                },
            };
            if descriptor.implicit.is_none() && !seen_keys.insert(descriptor.key.clone()) {
                return Err(SchemaError::DuplicateField {
                    type_name: spec.name.clone(),
                    key: descriptor.key.clone(),
                });
            }
            fields.push(descriptor);
        }

        Ok(TypeSchema {
            name: spec.name.clone(),
            fields,
            guard: constructor.guard.clone(),
        })
    }
}
