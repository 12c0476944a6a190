//! Registers prepared operations on the [``SchemaBuilder``]
use std::sync::Arc;

use async_graphql::{dynamic::TypeRef, Context, Result, Value};
use async_trait::async_trait;

use super::SchemaBuilder;
use crate::operations::{preparer::Prepared, Arguments, Operation};

/// The name of the placeholder query
pub const DUMMY: &str = "dummy";

/// Registers ``prepared`` and then ``additional`` mutations. Additional ones
/// replace prepared ones with the same name. The schema gets a mutation root
/// as soon as there is at least one mutation.
pub fn add_mutations(builder: &mut SchemaBuilder, prepared: Prepared, additional: Prepared) {
    let all = merge(prepared, additional);
    let any = !all.is_empty();

    for (name, operation) in all {
        builder.add_mutation_field(name, operation);
    }

    if any && !builder.has_mutation_root() {
        builder.attach_mutation_root();
    }
}

/// Like [``add_mutations``]. A query root without any field is not a valid
/// schema, so [``Dummy``] is registered if nothing else ever was.
pub fn add_queries(builder: &mut SchemaBuilder, prepared: Prepared, additional: Prepared) {
    let all = merge(prepared, additional);
    let none = all.is_empty();

    for (name, operation) in all {
        builder.add_query_field(name, operation);
    }

    if none && builder.query_fields().is_empty() {
        builder.add_query_field(DUMMY.to_string(), Arc::new(Dummy));
    }
}

fn merge(mut prepared: Prepared, additional: Prepared) -> Prepared {
    prepared.extend(additional);
    prepared
}

/// Dummy
///
/// Placeholder query, always resolves to an empty string
pub struct Dummy;

#[async_trait]
impl Operation for Dummy {
    fn graphql_name(&self) -> &str {
        "Dummy"
    }

    fn return_type(&self) -> TypeRef {
        TypeRef::named_nn(TypeRef::STRING)
    }

    fn description(&self) -> Option<String> {
        Some("Placeholder, the schema has no other queries".to_string())
    }

    async fn resolve(&self, _ctx: &Context<'_>, _args: Arguments) -> Result<Value> {
        Ok(Value::String(String::new()))
    }
}
