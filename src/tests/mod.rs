use async_graphql::{dynamic::TypeRef, Context, Result, Value};
use async_trait::async_trait;

use crate::operations::{Arguments, Operation};

mod schema;

/// An operation resolving to its own name
pub(crate) struct Named(pub &'static str);

#[async_trait]
impl Operation for Named {
    fn graphql_name(&self) -> &str {
        self.0
    }

    fn return_type(&self) -> TypeRef {
        TypeRef::named_nn(TypeRef::STRING)
    }

    async fn resolve(&self, _ctx: &Context<'_>, _args: Arguments) -> Result<Value> {
        Ok(Value::from(self.0))
    }
}
