//! Access grants from buckets and databases to services.

use indexmap::IndexMap;
use serde_json::{json, Value};

use suga_spec::ResourceType;

use crate::error::{EngineError, EngineResult};

/// Shorthand granting every action of a category.
pub const ALL_ACTIONS: &str = "all";

const BUCKET_ACTIONS: &[&str] = &["read", "write", "delete"];
const DATABASE_ACTIONS: &[&str] = &["query", "mutate"];

/// The actions a resource category understands, in canonical order.
pub fn vocabulary(category: ResourceType) -> &'static [&'static str] {
    match category {
        ResourceType::Bucket => BUCKET_ACTIONS,
        ResourceType::Database => DATABASE_ACTIONS,
        ResourceType::Service | ResourceType::Entrypoint => &[],
    }
}

/// Expand requested actions into a deduplicated list in canonical order.
///
/// `all` expands to the whole vocabulary. Any other action must belong to
/// the category's vocabulary.
pub fn expand_actions<S: AsRef<str>>(
    resource: &str,
    actions: &[S],
    category: ResourceType,
) -> EngineResult<Vec<String>> {
    let vocabulary = vocabulary(category);
    let mut granted = vec![false; vocabulary.len()];

    for action in actions {
        let action = action.as_ref();
        if action == ALL_ACTIONS {
            granted.iter_mut().for_each(|g| *g = true);
            continue;
        }
        match vocabulary.iter().position(|v| *v == action) {
            Some(index) => granted[index] = true,
            None => {
                return Err(EngineError::InvalidAction {
                    resource: resource.to_string(),
                    action: action.to_string(),
                    category: category.to_string(),
                })
            }
        }
    }

    Ok(vocabulary
        .iter()
        .zip(granted)
        .filter(|(_, granted)| *granted)
        .map(|(action, _)| action.to_string())
        .collect())
}

/// The descriptor a resource module receives for one consuming service.
pub fn access_descriptor(actions: Vec<String>, identities: &IndexMap<String, Value>) -> Value {
    json!({
        "actions": actions,
        "identities": identities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_expands_to_vocabulary() {
        assert_eq!(
            expand_actions("files", &["all"], ResourceType::Bucket).unwrap(),
            vec!["read", "write", "delete"]
        );
        assert_eq!(
            expand_actions("orders", &["all"], ResourceType::Database).unwrap(),
            vec!["query", "mutate"]
        );
    }

    #[test]
    fn test_expansion_is_a_canonical_set() {
        let once = expand_actions("files", &["delete", "read", "read"], ResourceType::Bucket)
            .unwrap();
        assert_eq!(once, vec!["read", "delete"]);

        let twice = expand_actions("files", &once[..], ResourceType::Bucket).unwrap();
        assert_eq!(once, twice);

        let mixed = expand_actions("files", &["write", "all"], ResourceType::Bucket).unwrap();
        assert_eq!(mixed, vec!["read", "write", "delete"]);
    }

    #[test]
    fn test_empty_request_grants_nothing() {
        let actions: [&str; 0] = [];
        assert!(expand_actions("files", &actions, ResourceType::Bucket)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_action() {
        let err = expand_actions("orders", &["read"], ResourceType::Database).unwrap_err();
        match err {
            EngineError::InvalidAction {
                resource,
                action,
                category,
            } => {
                assert_eq!(resource, "orders");
                assert_eq!(action, "read");
                assert_eq!(category, "database");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_descriptor_shape() {
        let mut identities = IndexMap::new();
        identities.insert(
            "aws:iam:role".to_string(),
            Value::String("${module.api_iam-role_role.suga}".into()),
        );

        let descriptor = access_descriptor(vec!["read".into()], &identities);
        assert_eq!(descriptor["actions"], json!(["read"]));
        assert_eq!(
            descriptor["identities"]["aws:iam:role"],
            json!("${module.api_iam-role_role.suga}")
        );
    }
}
