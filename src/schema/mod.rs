//! The schema registry
//!
//! A [``SchemaBuilder``] is created at boot, every mount registers its
//! operations on it and [``SchemaBuilder::finish``] seals it into the schema
//! requests are executed against. Mounts happen one after another, the builder
//! is never shared.
use std::sync::Arc;

use async_graphql::{
    dynamic::{self, Field, FieldFuture, FieldValue, InputValue, Object, SchemaError},
    Name, Value,
};
use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::{
    identity::IdentityProvider,
    mount::Mount,
    operations::{Arguments, Operation},
    resource::field_name,
};

pub mod registrar;
pub mod types;

pub use types::TypeDef;

pub type AuthSchema = dynamic::Schema;

pub const QUERY_ROOT: &str = "Query";
pub const MUTATION_ROOT: &str = "Mutation";

/// SchemaBuilder
///
/// Holds the mutation and query fields registered so far, keyed by their
/// qualified name. Registering a name twice replaces the earlier field.
#[derive(Default)]
pub struct SchemaBuilder {
    mutations: IndexMap<String, Arc<dyn Operation>>,
    queries: IndexMap<String, Arc<dyn Operation>>,
    /// if the schema gets a mutation root
    mutation_root: bool,
    types: IndexMap<String, TypeDef>,
    mounts: Vec<Mount>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object type of the host application, e.g. the result type
    /// of a resource. Types registered here take precedence over the ones
    /// operations bring along.
    pub fn register_type(&mut self, ty: TypeDef) -> &mut Self {
        self.types.insert(ty.name().to_string(), ty);
        self
    }

    pub fn lookup_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn mutation_fields(&self) -> &IndexMap<String, Arc<dyn Operation>> {
        &self.mutations
    }

    pub fn query_fields(&self) -> &IndexMap<String, Arc<dyn Operation>> {
        &self.queries
    }

    pub fn has_mutation_root(&self) -> bool {
        self.mutation_root
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// Every path a resource was mounted at, without duplicates
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = vec![];
        for mount in &self.mounts {
            if !paths.contains(&mount.path) {
                paths.push(mount.path.clone());
            }
        }
        paths
    }

    pub(crate) fn add_mutation_field(&mut self, name: String, operation: Arc<dyn Operation>) {
        insert_field(&mut self.mutations, "mutation", name, operation);
    }

    pub(crate) fn add_query_field(&mut self, name: String, operation: Arc<dyn Operation>) {
        insert_field(&mut self.queries, "query", name, operation);
    }

    pub(crate) fn attach_mutation_root(&mut self) {
        self.mutation_root = true;
    }

    pub(crate) fn add_mount(&mut self, mount: Mount) {
        self.mounts.push(mount);
    }

    /// Seals the registry. Field names are the lower camel case form of the
    /// qualified names (``user_sign_up`` becomes ``userSignUp``).
    ///
    /// Fails if nothing was ever mounted, the query root would be empty, or if
    /// a mount returns accounts as a type that neither the host registered
    /// nor an operation brought along.
    pub fn finish(self, identity: Arc<dyn IdentityProvider>) -> Result<AuthSchema, SchemaError> {
        if self.queries.is_empty() {
            return Err(SchemaError(
                "nothing was mounted, the query root has no fields".to_string(),
            ));
        }
        let mut types = self.types;

        let mut query = Object::new(QUERY_ROOT);
        for (name, operation) in self.queries {
            collect_types(&mut types, operation.as_ref());
            query = query.field(operation_field(&name, operation));
        }

        let mut mutation = Object::new(MUTATION_ROOT);
        if self.mutation_root {
            for (name, operation) in self.mutations {
                collect_types(&mut types, operation.as_ref());
                mutation = mutation.field(operation_field(&name, operation));
            }
        }

        for mount in &self.mounts {
            if !types.contains_key(&mount.authenticatable_type) {
                return Err(SchemaError(format!(
                    "{} returns accounts as {}, but no such type was registered",
                    mount.resource, mount.authenticatable_type
                )));
            }
        }

        let mutation_root = self.mutation_root.then_some(MUTATION_ROOT);
        let mut schema = dynamic::Schema::build(QUERY_ROOT, mutation_root, None);
        if self.mutation_root {
            schema = schema.register(mutation);
        }

        info!(
            "sealing schema with {} types for {} mounts",
            types.len(),
            self.mounts.len()
        );
        schema = schema.register(query);
        for (_, ty) in types {
            schema = schema.register(ty.into_object());
        }
        schema.data(identity).finish()
    }
}

/// Registering a name again replaces the field. So does registering a
/// different name that is exposed under the same field name
/// (``user_login`` and ``userLogin``).
fn insert_field(
    fields: &mut IndexMap<String, Arc<dyn Operation>>,
    kind: &str,
    name: String,
    operation: Arc<dyn Operation>,
) {
    let exposed = field_name(&name);
    let shadowed = fields
        .keys()
        .find(|key| **key != name && field_name(key) == exposed)
        .cloned();
    if let Some(shadowed) = shadowed {
        warn!(
            "{} {} replaces {}, both are exposed as {}",
            kind, name, shadowed, exposed
        );
        fields.shift_remove(&shadowed);
    }
    debug!("registering {} {} ({})", kind, name, operation.graphql_name());
    fields.insert(name, operation);
}

fn collect_types(types: &mut IndexMap<String, TypeDef>, operation: &dyn Operation) {
    for ty in operation.types() {
        types.entry(ty.name().to_string()).or_insert(ty);
    }
}

fn operation_field(name: &str, operation: Arc<dyn Operation>) -> Field {
    let arguments = operation.arguments();
    let description = operation.description();

    let mut field = Field::new(field_name(name), operation.return_type(), move |ctx| {
        let operation = operation.clone();
        FieldFuture::new(async move {
            let args: IndexMap<Name, Value> = ctx
                .args
                .iter()
                .map(|(name, value)| (name.clone(), value.as_value().clone()))
                .collect();
            let value = operation.resolve(ctx.ctx, Arguments::from(args)).await?;
            Ok(Some(FieldValue::value(value)))
        })
    });

    for argument in arguments {
        field = field.argument(InputValue::new(field_name(&argument.name), argument.ty));
    }
    if let Some(description) = description {
        field = field.description(description);
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        identity::MemoryIdentity,
        mount::{mount_for, MountOptions},
        tests::Named,
    };

    fn identity() -> Arc<dyn IdentityProvider> {
        Arc::new(MemoryIdentity::default())
    }

    #[test]
    fn test_same_field_name_replaces_the_field() {
        let mut builder = SchemaBuilder::new();
        mount_for(
            &mut builder,
            "User",
            MountOptions::new()
                .only(["login", "logout"])
                .additional_mutation("userLogin", Arc::new(Named("MyLogin"))),
        )
        .unwrap();

        let fields: Vec<_> = builder
            .mutation_fields()
            .iter()
            .map(|(name, op)| (name.as_str(), op.graphql_name()))
            .collect();
        assert_eq!(
            fields,
            [("user_logout", "UserLogout"), ("userLogin", "MyLogin")]
        );
    }

    #[test]
    fn test_finish_without_mounts() {
        let err = SchemaBuilder::new()
            .finish(identity())
            .err()
            .expect("an empty query root is rejected");
        assert!(err.to_string().contains("nothing was mounted"));
    }

    #[test]
    fn test_finish_with_unknown_authenticatable_type() {
        let mut builder = SchemaBuilder::new();
        mount_for(
            &mut builder,
            "User",
            MountOptions::new().authenticatable_type("Account"),
        )
        .unwrap();
        let err = builder
            .finish(identity())
            .err()
            .expect("the type is missing");
        assert!(err
            .to_string()
            .contains("User returns accounts as Account"));

        let mut builder = SchemaBuilder::new();
        builder.register_type(
            TypeDef::new("Account")
                .field("email", dynamic::TypeRef::named_nn(dynamic::TypeRef::STRING)),
        );
        mount_for(
            &mut builder,
            "User",
            MountOptions::new().authenticatable_type("Account"),
        )
        .unwrap();
        assert!(builder.finish(identity()).is_ok());
    }
}
