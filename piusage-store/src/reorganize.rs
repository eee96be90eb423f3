//! Key reorganization on account switch.
//!
//! Switching accounts moves the chosen entry to the bare provider key and
//! renumbers every other entry of the provider to `prefix-1..n`.

use std::collections::HashSet;

use piusage_core::match_prefix;
use serde_json::Map;
use tracing::debug;

use crate::credentials::CredentialStore;
use crate::error::StoreError;

/// Returns a copy of `store` with `selected_key` promoted to `prefix`.
///
/// - The selected entry ends up under the bare `prefix` key, at the position
///   of the first key of the group.
/// - The other entries of the group follow as `prefix-1`, `prefix-2`, ...
///   in their original file order, with no gaps.
/// - Keys outside the group keep their values and relative order.
///
/// # Errors
///
/// `EntryNotFound` if `selected_key` is absent, `PrefixMismatch` if it is
/// not an entry of `prefix`.
pub fn reorganize(
    store: &CredentialStore,
    selected_key: &str,
    prefix: &str,
) -> Result<CredentialStore, StoreError> {
    let raw = store.raw();
    let selected = raw
        .get(selected_key)
        .ok_or_else(|| StoreError::EntryNotFound(selected_key.to_string()))?;
    if match_prefix(selected_key, prefix).is_none() {
        return Err(StoreError::PrefixMismatch {
            key: selected_key.to_string(),
            prefix: prefix.to_string(),
        });
    }

    let others: Vec<&str> = raw
        .keys()
        .filter(|key| key.as_str() != selected_key && match_prefix(key, prefix).is_some())
        .map(String::as_str)
        .collect();

    let mut out = Map::new();
    let mut group_placed = false;
    for (key, value) in raw {
        if match_prefix(key, prefix).is_none() {
            out.insert(key.clone(), value.clone());
            continue;
        }
        if group_placed {
            continue;
        }
        group_placed = true;

        out.insert(prefix.to_string(), selected.clone());
        let mut used: HashSet<usize> = HashSet::new();
        let mut next = 1;
        for other in &others {
            while used.contains(&next) {
                next += 1;
            }
            used.insert(next);
            let new_key = format!("{prefix}-{next}");
            debug!(from = other, to = %new_key, "Renumbering credential");
            out.insert(new_key, raw[*other].clone());
        }
    }

    let mut reorganized = store.clone();
    reorganized.replace_raw(out);
    Ok(reorganized)
}

impl CredentialStore {
    /// Promotes `key` to the selected entry of `prefix` in place.
    ///
    /// # Errors
    ///
    /// See [`reorganize`].
    pub fn select(&mut self, key: &str, prefix: &str) -> Result<(), StoreError> {
        *self = reorganize(self, key, prefix)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn store_from(value: Value) -> CredentialStore {
        let Value::Object(map) = value else {
            panic!("test store must be an object");
        };
        CredentialStore::from_map("/tmp/auth.json", map)
    }

    fn keys(store: &CredentialStore) -> Vec<&str> {
        store.keys().collect()
    }

    fn group_values(store: &CredentialStore, prefix: &str) -> Vec<String> {
        let mut values: Vec<String> = store
            .raw()
            .iter()
            .filter(|(k, _)| match_prefix(k, prefix).is_some())
            .map(|(_, v)| v.to_string())
            .collect();
        values.sort();
        values
    }

    #[test]
    fn test_every_selection_yields_contiguous_keys() {
        let orderings = [
            ["p", "p-1", "p-2"],
            ["p-2", "p", "p-1"],
            ["p-1", "p-2", "p"],
            ["p-2", "p-1", "p"],
        ];
        for order in orderings {
            let mut map = Map::new();
            for key in order {
                map.insert(key.to_string(), json!({"type": "oauth", "access": key}));
            }
            let store = CredentialStore::from_map("/tmp/auth.json", map);

            for selected in order {
                let out = reorganize(&store, selected, "p").unwrap();
                let mut got = keys(&out);
                got.sort_unstable();
                assert_eq!(got, vec!["p", "p-1", "p-2"], "order {order:?}, selected {selected}");
                assert_eq!(out.get("p").unwrap().access.as_deref(), Some(selected));
            }
        }
    }

    #[test]
    fn test_values_preserved_and_others_untouched() {
        let store = store_from(json!({
            "openai": {"type": "api_key", "key": "sk"},
            "anthropic-1": {"type": "oauth", "access": "a1", "email": "one@example.com"},
            "zai": {"type": "api_key", "key": "z"},
            "anthropic": {"type": "oauth", "access": "a0"},
            "anthropic-5": {"type": "oauth", "access": "a5", "custom": [1, 2]},
        }));

        let out = reorganize(&store, "anthropic-5", "anthropic").unwrap();

        assert_eq!(group_values(&store, "anthropic"), group_values(&out, "anthropic"));
        assert_eq!(out.raw()["openai"], store.raw()["openai"]);
        assert_eq!(out.raw()["zai"], store.raw()["zai"]);
        assert_eq!(out.raw()["anthropic"]["custom"], json!([1, 2]));
    }

    #[test]
    fn test_others_keep_enumeration_order() {
        let store = store_from(json!({
            "anthropic-7": {"access": "seven"},
            "anthropic": {"access": "zero"},
            "anthropic-2": {"access": "two"},
        }));

        let out = reorganize(&store, "anthropic-2", "anthropic").unwrap();
        assert_eq!(keys(&out), vec!["anthropic", "anthropic-1", "anthropic-2"]);
        assert_eq!(out.raw()["anthropic"]["access"], "two");
        assert_eq!(out.raw()["anthropic-1"]["access"], "seven");
        assert_eq!(out.raw()["anthropic-2"]["access"], "zero");
    }

    #[test]
    fn test_group_takes_position_of_first_member() {
        let store = store_from(json!({
            "openai": {},
            "anthropic-1": {"access": "a1"},
            "zai": {},
            "anthropic": {"access": "a0"},
        }));

        let out = reorganize(&store, "anthropic-1", "anthropic").unwrap();
        assert_eq!(keys(&out), vec!["openai", "anthropic", "anthropic-1", "zai"]);
    }

    #[test]
    fn test_similar_prefixes_are_not_touched() {
        let store = store_from(json!({
            "openai": {"key": "o"},
            "openai-codex": {"access": "c"},
            "openai-1": {"key": "o1"},
        }));

        let out = reorganize(&store, "openai-1", "openai").unwrap();
        assert_eq!(out.raw()["openai-codex"]["access"], "c");
        assert_eq!(out.raw()["openai"]["key"], "o1");
        assert_eq!(out.raw()["openai-1"]["key"], "o");
    }

    #[test]
    fn test_zero_suffixes_stay_outside_the_group() {
        let store = store_from(json!({
            "zai": {"key": "a"},
            "zai-0": {"key": "zero"},
            "zai-01": {"key": "padded"},
            "zai-1": {"key": "b"},
        }));

        let out = reorganize(&store, "zai-1", "zai").unwrap();
        assert_eq!(out.raw()["zai"]["key"], "b");
        assert_eq!(out.raw()["zai-1"]["key"], "a");
        assert_eq!(out.raw()["zai-0"]["key"], "zero");
        assert_eq!(out.raw()["zai-01"]["key"], "padded");
        assert_eq!(out.raw().len(), 4);
    }

    #[test]
    fn test_selecting_current_is_stable() {
        let store = store_from(json!({
            "anthropic": {"access": "a0"},
            "anthropic-1": {"access": "a1"},
        }));
        let out = reorganize(&store, "anthropic", "anthropic").unwrap();
        assert_eq!(out, store);
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let store = store_from(json!({"anthropic": {"access": "a0"}}));
        assert!(matches!(
            reorganize(&store, "anthropic-3", "anthropic"),
            Err(StoreError::EntryNotFound(_))
        ));
        assert!(matches!(
            reorganize(&store, "anthropic", "zai"),
            Err(StoreError::PrefixMismatch { .. })
        ));
    }

    #[test]
    fn test_select_in_place() {
        let mut store = store_from(json!({
            "zai": {"key": "z"},
            "zai-1": {"key": "z1"},
        }));
        store.select("zai-1", "zai").unwrap();
        assert_eq!(store.get("zai").unwrap().key.as_deref(), Some("z1"));
        assert_eq!(store.get("zai-1").unwrap().key.as_deref(), Some("z"));
    }
}
