use indexmap::IndexMap;

use super::{DefaultOperation, Handler};

/// Operation name to handler, in the order the operations were declared
pub type Catalog = IndexMap<String, Handler>;

pub fn default_mutations() -> Catalog {
    catalog(&DefaultOperation::MUTATIONS)
}

pub fn default_queries() -> Catalog {
    catalog(&DefaultOperation::QUERIES)
}

fn catalog(operations: &[DefaultOperation]) -> Catalog {
    operations
        .iter()
        .map(|op| (op.name().to_string(), Handler::Default(*op)))
        .collect()
}
