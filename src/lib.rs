//! Authentication operations for a GraphQL schema
//!
//! For every authenticatable resource of an application (e.g. a ``User``), a
//! mount decides which of the default operations (login, logout, sign up,
//! password reset, confirmation) end up on the schema, under which names and
//! with which types. The actual authentication is done by an
//! [``identity::IdentityProvider``].
//!
//! ```no_run
//! use std::sync::Arc;
//! use graphql_auth::{identity::MemoryIdentity, mount_for, MountOptions, SchemaBuilder};
//!
//! let mut builder = SchemaBuilder::new();
//! mount_for(&mut builder, "User", MountOptions::new().skip(["sign_up"])).unwrap();
//! let schema = builder.finish(Arc::new(MemoryIdentity::default())).unwrap();
//! ```
pub mod config;
pub mod fallible;
pub mod identity;
pub mod mount;
pub mod operations;
pub mod resource;
pub mod schema;

#[cfg(test)]
mod tests;

pub use mount::{mount_for, Mount, MountOptions};
pub use schema::{AuthSchema, SchemaBuilder};
