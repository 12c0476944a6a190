//! Validates an [``OperationRequest``] before anything is resolved
use crate::fallible::MountError;

use super::{Catalog, OperationRequest};

/// Every name in ``custom``, ``only`` and ``skipped`` has to exist in one of the
/// catalogs, and ``only`` and ``skipped`` exclude each other.
pub fn validate(
    mutations: &Catalog,
    queries: &Catalog,
    request: &OperationRequest,
) -> Result<(), MountError> {
    let known = |name: &str| mutations.contains_key(name) || queries.contains_key(name);

    let requested = request
        .custom
        .keys()
        .chain(request.only.iter())
        .chain(request.skipped.iter());

    for name in requested {
        if !known(name.as_str()) {
            return Err(MountError::UnknownOperation {
                operation: name.clone(),
                known: mutations.keys().chain(queries.keys()).cloned().collect(),
            });
        }
    }

    if !request.only.is_empty() && !request.skipped.is_empty() {
        return Err(MountError::ConflictingFilters {
            only: request.only.clone(),
            skip: request.skipped.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        operations::{default_mutations, default_queries},
        tests::Named,
    };

    fn check(request: &OperationRequest) -> Result<(), MountError> {
        validate(&default_mutations(), &default_queries(), request)
    }

    #[test]
    fn test_known_operations_pass() {
        let mut request = OperationRequest::default();
        assert_eq!(check(&request), Ok(()));

        request
            .custom
            .insert("login".to_string(), Arc::new(Named("CustomLogin")));
        request
            .custom
            .insert("confirm_account".to_string(), Arc::new(Named("CustomConfirm")));
        request.only = vec!["sign_up".to_string(), "check_password_token".to_string()];
        assert_eq!(check(&request), Ok(()));
    }

    #[test]
    fn test_unknown_operation() {
        for request in [
            OperationRequest {
                only: vec!["sign_in".to_string()],
                ..Default::default()
            },
            OperationRequest {
                skipped: vec!["logout".to_string(), "invite".to_string()],
                ..Default::default()
            },
        ] {
            match check(&request) {
                Err(MountError::UnknownOperation { operation, known }) => {
                    assert!(operation == "sign_in" || operation == "invite");
                    assert_eq!(known.len(), 8);
                }
                other => panic!("expected UnknownOperation, got {:?}", other),
            }
        }

        let mut request = OperationRequest::default();
        request
            .custom
            .insert("query".to_string(), Arc::new(Named("Resolver")));
        assert!(matches!(
            check(&request),
            Err(MountError::UnknownOperation { operation, .. }) if operation == "query"
        ));
    }

    #[test]
    fn test_conflicting_filters() {
        let request = OperationRequest {
            only: vec!["login".to_string()],
            skipped: vec!["logout".to_string()],
            ..Default::default()
        };
        assert_eq!(
            check(&request),
            Err(MountError::ConflictingFilters {
                only: vec!["login".to_string()],
                skip: vec!["logout".to_string()],
            })
        );
    }
}
