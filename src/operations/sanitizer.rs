//! Merges a catalog with the overrides and filters of a mount
use indexmap::IndexMap;

use super::{Catalog, Handler, OperationRequest};
use crate::resource::Resource;

/// Resolves the operations of ``catalog`` a mount of ``resource`` ends up with.
///
/// Overrides only replace operations the catalog has. ``only`` wins over
/// ``skipped`` and keeps its own order; names it lists that are not in the
/// catalog are dropped silently, they may belong to the other catalog.
/// The keys of the result are qualified with the resource mapping.
pub fn resolve(
    resource: &Resource,
    catalog: &Catalog,
    request: &OperationRequest,
) -> IndexMap<String, Handler> {
    let mut operations = catalog.clone();

    for (name, handler) in operations.iter_mut() {
        if let Some(custom) = request.custom.get(name) {
            *handler = Handler::Custom(custom.clone());
        }
    }

    if !request.only.is_empty() {
        operations = request
            .only
            .iter()
            .filter_map(|name| {
                operations
                    .get(name)
                    .map(|handler| (name.clone(), handler.clone()))
            })
            .collect();
    } else if !request.skipped.is_empty() {
        operations.retain(|name, _| !request.skipped.contains(name));
    }

    operations
        .into_iter()
        .map(|(name, handler)| (resource.qualify(&name), handler))
        .collect()
}
