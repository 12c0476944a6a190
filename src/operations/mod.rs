//! Operations
//!
//! Everything that decides which mutations and queries a resource gets. A mount
//! runs the stages in this order:
//!
//! 1. [``checker::validate``] rejects requests naming unknown operations
//! 2. [``sanitizer::resolve``] merges the catalog with the overrides and filters
//! 3. [``preparer::prepare``] binds every default operation to the resource
//!
//! and hands the result to the [``crate::schema::registrar``].
use std::{fmt, sync::Arc};

use async_graphql::{dynamic::TypeRef, Context, Name, Result, Value};
use async_trait::async_trait;
use indexmap::IndexMap;

use crate::{
    resource::{field_name, Resource},
    schema::TypeDef,
};

mod catalog;
pub mod checker;
mod defaults;
pub mod preparer;
pub mod sanitizer;

pub use catalog::{default_mutations, default_queries, Catalog};
pub use defaults::{DefaultOperation, ResourceOperation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Mutation,
    Query,
}

/// Operation
///
/// A field on the mutation or query root. The schema only talks to operations
/// through this trait, no matter if they are shipped defaults bound to a
/// resource or supplied by the host application.
#[async_trait]
pub trait Operation: Send + Sync {
    /// The public name, e.g. ``UserLogin``. Mutations name their payload after it.
    fn graphql_name(&self) -> &str;

    fn return_type(&self) -> TypeRef;

    fn arguments(&self) -> Vec<Argument> {
        vec![]
    }

    /// Object types ``return_type`` refers to which have to exist on the schema
    fn types(&self) -> Vec<TypeDef> {
        vec![]
    }

    /// The resource the operation authenticates against, if it is bound to one
    fn resource(&self) -> Option<&Resource> {
        None
    }

    fn description(&self) -> Option<String> {
        None
    }

    async fn resolve(&self, ctx: &Context<'_>, args: Arguments) -> Result<Value>;
}

/// An argument of an [``Operation``]. The name is snake case and exposed in
/// lower camel case.
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: String,
    pub ty: TypeRef,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn required_string(name: impl Into<String>) -> Self {
        Self::new(name, TypeRef::named_nn(TypeRef::STRING))
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, TypeRef::named(TypeRef::STRING))
    }
}

/// The arguments a field was called with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(IndexMap<Name, Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument, ``name`` is snake case like in [``Argument``]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(Name::new(field_name(name)), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .get(field_name(name).as_str())
            .filter(|value| **value != Value::Null)
    }

    pub fn opt_string(&self, name: &str) -> Option<String> {
        match self.get(name) {
            Some(Value::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Result<String> {
        self.opt_string(name)
            .ok_or_else(|| format!("argument `{}` is required", field_name(name)).into())
    }
}

impl From<IndexMap<Name, Value>> for Arguments {
    fn from(arguments: IndexMap<Name, Value>) -> Self {
        Self(arguments)
    }
}

/// Handler
///
/// An entry of a [``Catalog``] or of a resolved operation set
#[derive(Clone)]
pub enum Handler {
    /// shipped with the crate, specialized for every resource it is mounted for
    Default(DefaultOperation),
    /// supplied by the host application and registered as it is
    Custom(Arc<dyn Operation>),
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Handler::Default(a), Handler::Default(b)) => a == b,
            (Handler::Custom(a), Handler::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Default(operation) => f.debug_tuple("Default").field(operation).finish(),
            Handler::Custom(operation) => f
                .debug_tuple("Custom")
                .field(&operation.graphql_name())
                .finish(),
        }
    }
}

/// OperationRequest
///
/// What a mount asks for: overrides for single operations and at most one of
/// the two filters. Names are bare operation names like ``sign_up``.
#[derive(Clone, Default)]
pub struct OperationRequest {
    pub custom: IndexMap<String, Arc<dyn Operation>>,
    pub only: Vec<String>,
    pub skipped: Vec<String>,
}
