//! Mounting
//!
//! [``mount_for``] is what a host application calls once per resource while it
//! boots. It decides which operations the resource gets and registers them on
//! the [``SchemaBuilder``].
use std::sync::Arc;

use indexmap::IndexMap;
use log::info;

use crate::{
    fallible::MountError,
    operations::{
        checker, default_mutations, default_queries, preparer, sanitizer, Operation,
        OperationRequest,
    },
    resource::Resource,
    schema::{registrar, types::AUTHENTICATABLE, SchemaBuilder},
};

/// The path the schema is served at unless a mount says otherwise
pub const DEFAULT_PATH: &str = "/graphql_auth";

/// MountOptions
///
/// Everything a mount can change about the operations of a resource.
/// Operation names are bare names like ``sign_up``.
#[derive(Clone, Default)]
pub struct MountOptions {
    request: OperationRequest,
    additional_mutations: IndexMap<String, Arc<dyn Operation>>,
    additional_queries: IndexMap<String, Arc<dyn Operation>>,
    at: Option<String>,
    authenticatable_type: Option<String>,
}

impl MountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default operation ``name``
    pub fn operation(mut self, name: impl Into<String>, operation: Arc<dyn Operation>) -> Self {
        self.request.custom.insert(name.into(), operation);
        self
    }

    /// Mounts only these operations
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.only = names.into_iter().map(Into::into).collect();
        self
    }

    /// Mounts every operation but these
    pub fn skip<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.skipped = names.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a mutation under exactly this name, it is not checked against the catalog
    pub fn additional_mutation(
        mut self,
        name: impl Into<String>,
        operation: Arc<dyn Operation>,
    ) -> Self {
        self.additional_mutations.insert(name.into(), operation);
        self
    }

    /// Adds a query under exactly this name, it is not checked against the catalog
    pub fn additional_query(mut self, name: impl Into<String>, operation: Arc<dyn Operation>) -> Self {
        self.additional_queries.insert(name.into(), operation);
        self
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.at = Some(path.into());
        self
    }

    /// The type accounts of the resource are returned as
    pub fn authenticatable_type(mut self, name: impl Into<String>) -> Self {
        self.authenticatable_type = Some(name.into());
        self
    }
}

/// The outcome of a successful mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub resource: Resource,
    pub path: String,
    pub authenticatable_type: String,
}

/// Mounts the operations of ``resource`` on ``builder``.
///
/// Fails without touching ``builder`` if the options name an unknown operation
/// or use ``only`` and ``skip`` together.
pub fn mount_for(
    builder: &mut SchemaBuilder,
    resource: impl Into<Resource>,
    options: MountOptions,
) -> Result<Mount, MountError> {
    let resource = resource.into();
    let MountOptions {
        request,
        additional_mutations,
        additional_queries,
        at,
        authenticatable_type,
    } = options;

    let mutations = default_mutations();
    let queries = default_queries();
    checker::validate(&mutations, &queries, &request)?;

    let authenticatable_type = authenticatable_type_for(builder, &resource, authenticatable_type);

    let prepared_mutations = preparer::prepare(
        &resource,
        sanitizer::resolve(&resource, &mutations, &request),
        &authenticatable_type,
    );
    let prepared_queries = preparer::prepare(
        &resource,
        sanitizer::resolve(&resource, &queries, &request),
        &authenticatable_type,
    );

    info!(
        "mounting {} mutations and {} queries for {}",
        prepared_mutations.len() + additional_mutations.len(),
        prepared_queries.len() + additional_queries.len(),
        resource
    );
    registrar::add_mutations(builder, prepared_mutations, additional_mutations);
    registrar::add_queries(builder, prepared_queries, additional_queries);

    let mount = Mount {
        resource,
        path: at.unwrap_or_else(|| DEFAULT_PATH.to_string()),
        authenticatable_type,
    };
    builder.add_mount(mount.clone());
    Ok(mount)
}

/// An explicit type wins, then a registered type named after the resource
/// (``AdminStaff`` for ``Admin/Staff``) and finally the generic ``Authenticatable``.
fn authenticatable_type_for(
    builder: &SchemaBuilder,
    resource: &Resource,
    explicit: Option<String>,
) -> String {
    explicit
        .filter(|name| !name.is_empty())
        .or_else(|| {
            let conventional = resource.graphql_prefix();
            builder
                .lookup_type(&conventional)
                .map(|_| conventional)
        })
        .unwrap_or_else(|| AUTHENTICATABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schema::{registrar::DUMMY, TypeDef},
        tests::Named,
    };

    fn keys<V>(fields: &IndexMap<String, V>) -> Vec<&str> {
        fields.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_mount_defaults() {
        let mut builder = SchemaBuilder::new();
        let mount = mount_for(&mut builder, "User", MountOptions::new()).unwrap();

        assert_eq!(mount.path, DEFAULT_PATH);
        assert_eq!(mount.authenticatable_type, AUTHENTICATABLE);
        assert_eq!(
            keys(builder.mutation_fields()),
            [
                "user_login",
                "user_logout",
                "user_sign_up",
                "user_update_password",
                "user_send_password_reset",
                "user_resend_confirmation"
            ]
        );
        assert_eq!(
            keys(builder.query_fields()),
            ["user_confirm_account", "user_check_password_token"]
        );
        assert!(builder.has_mutation_root());
        assert_eq!(builder.mounts(), [mount]);
    }

    #[test]
    fn test_mount_with_overrides() {
        let mut builder = SchemaBuilder::new();
        let login: Arc<dyn Operation> = Arc::new(Named("CustomLogin"));
        mount_for(
            &mut builder,
            "User",
            MountOptions::new()
                .operation("login", login.clone())
                .only(["login", "confirm_account"])
                .additional_mutation("register_device", Arc::new(Named("RegisterDevice")))
                .at("/api/v1/auth"),
        )
        .unwrap();

        assert_eq!(
            keys(builder.mutation_fields()),
            ["user_login", "register_device"]
        );
        assert!(Arc::ptr_eq(&builder.mutation_fields()["user_login"], &login));
        assert_eq!(keys(builder.query_fields()), ["user_confirm_account"]);
        assert_eq!(builder.paths(), ["/api/v1/auth"]);
    }

    #[test]
    fn test_every_query_skipped() {
        let mut builder = SchemaBuilder::new();
        mount_for(
            &mut builder,
            "User",
            MountOptions::new().skip(["confirm_account", "check_password_token"]),
        )
        .unwrap();
        assert_eq!(keys(builder.query_fields()), [DUMMY]);
    }

    #[test]
    fn test_invalid_mount_leaves_builder_untouched() {
        let mut builder = SchemaBuilder::new();
        let err = mount_for(
            &mut builder,
            "User",
            MountOptions::new().skip(["sign_in"]),
        )
        .unwrap_err();
        assert!(matches!(err, MountError::UnknownOperation { .. }));

        let err = mount_for(
            &mut builder,
            "User",
            MountOptions::new().only(["login"]).skip(["logout"]),
        )
        .unwrap_err();
        assert!(matches!(err, MountError::ConflictingFilters { .. }));

        assert!(builder.mutation_fields().is_empty());
        assert!(builder.query_fields().is_empty());
        assert!(builder.mounts().is_empty());
    }

    #[test]
    fn test_authenticatable_type_lookup() {
        let mut builder = SchemaBuilder::new();
        builder.register_type(
            TypeDef::new("AdminStaff").field(
                "email",
                async_graphql::dynamic::TypeRef::named_nn(async_graphql::dynamic::TypeRef::STRING),
            ),
        );

        let staff = mount_for(&mut builder, "Admin/Staff", MountOptions::new()).unwrap();
        assert_eq!(staff.authenticatable_type, "AdminStaff");
        assert_eq!(
            builder.query_fields()["admin_staff_confirm_account"]
                .return_type()
                .to_string(),
            "AdminStaff!"
        );

        let user = mount_for(
            &mut builder,
            "User",
            MountOptions::new().authenticatable_type("Account"),
        )
        .unwrap();
        assert_eq!(user.authenticatable_type, "Account");

        let guest = mount_for(&mut builder, "Guest", MountOptions::new()).unwrap();
        assert_eq!(guest.authenticatable_type, AUTHENTICATABLE);
    }
}
