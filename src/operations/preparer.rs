//! Binds resolved operations to their resource
use std::sync::Arc;

use indexmap::IndexMap;

use super::{Handler, Operation};
use crate::resource::Resource;

/// Qualified name to the operation that ends up on the schema
pub type Prepared = IndexMap<String, Arc<dyn Operation>>;

/// Default operations become a new [``super::ResourceOperation``] for
/// ``resource`` returning ``authenticatable_type``. Custom operations are taken
/// as they are, the host is responsible for their names and types.
pub fn prepare(
    resource: &Resource,
    operations: IndexMap<String, Handler>,
    authenticatable_type: &str,
) -> Prepared {
    operations
        .into_iter()
        .map(|(name, handler)| {
            let operation: Arc<dyn Operation> = match handler {
                Handler::Custom(operation) => operation,
                Handler::Default(operation) => {
                    Arc::new(operation.bind(resource, authenticatable_type))
                }
            };
            (name, operation)
        })
        .collect()
}
