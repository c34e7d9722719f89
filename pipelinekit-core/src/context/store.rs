// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Typed Store
//!
//! A mapping from a process-unique key identity (here, `TypeId` of a marker
//! key type) to an opaque boxed container, with typed accessors doing the
//! downcast. `K` is a zero-sized marker type that names both the key's
//! identity and, via `ContextKey::Value`, the type stored under it — two
//! different key types can never alias the same slot even if they happen to
//! store the same `Value` type.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use parking_lot::RwLock;

/// A marker type identifying one slot in a [`super::Context`]'s typed store.
/// Implement this on a zero-sized type per distinct piece of per-execution
/// state a middleware wants to thread through the chain.
pub trait ContextKey: 'static {
    /// The value type stored under this key.
    type Value: Send + Sync + 'static;
}

/// The typed, single-writer/multi-reader store backing `Context::set` /
/// `get` / `remove`. Internal locking makes it safe to call from any thread;
/// callers are responsible for not doing so concurrently on the same
/// execution, since a `Context` is exclusive to one in-flight execution's
/// task tree.
#[derive(Default)]
pub struct TypedStore {
    entries: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl TypedStore {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    pub fn set<K: ContextKey>(&self, value: K::Value) {
        self.entries.write().insert(TypeId::of::<K>(), Box::new(value));
    }

    pub fn get<K: ContextKey>(&self) -> Option<K::Value>
    where
        K::Value: Clone,
    {
        self.entries
            .read()
            .get(&TypeId::of::<K>())
            .and_then(|boxed| boxed.downcast_ref::<K::Value>())
            .cloned()
    }

    pub fn remove<K: ContextKey>(&self) -> Option<K::Value> {
        self.entries
            .write()
            .remove(&TypeId::of::<K>())
            .and_then(|boxed| boxed.downcast::<K::Value>().ok())
            .map(|boxed| *boxed)
    }

    pub fn contains<K: ContextKey>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<K>())
    }

    /// Clears every slot. Used when a context is returned to a pool: a
    /// pooled context must be fully reset before re-issue.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RetryCount;
    impl ContextKey for RetryCount {
        type Value = u32;
    }

    struct UserName;
    impl ContextKey for UserName {
        type Value = String;
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = TypedStore::new();
        store.set::<RetryCount>(3);
        assert_eq!(store.get::<RetryCount>(), Some(3));
    }

    #[test]
    fn remove_clears_the_slot() {
        let store = TypedStore::new();
        store.set::<RetryCount>(3);
        assert_eq!(store.remove::<RetryCount>(), Some(3));
        assert_eq!(store.get::<RetryCount>(), None);
    }

    #[test]
    fn distinct_key_types_never_alias() {
        let store = TypedStore::new();
        store.set::<UserName>("alice".to_string());
        assert_eq!(store.get::<UserName>(), Some("alice".to_string()));
        assert_eq!(store.get::<RetryCount>(), None);
    }

    #[test]
    fn clear_wipes_every_slot() {
        let store = TypedStore::new();
        store.set::<RetryCount>(1);
        store.set::<UserName>("bob".to_string());
        store.clear();
        assert_eq!(store.get::<RetryCount>(), None);
        assert_eq!(store.get::<UserName>(), None);
    }

    proptest::proptest! {
        // set(k, v); get(k) = v — for any value, not just the fixed
        // examples above.
        #[test]
        fn set_then_get_round_trips_for_any_value(value: u32, name in ".*") {
            let store = TypedStore::new();
            store.set::<RetryCount>(value);
            store.set::<UserName>(name.clone());
            proptest::prop_assert_eq!(store.get::<RetryCount>(), Some(value));
            proptest::prop_assert_eq!(store.get::<UserName>(), Some(name));
        }

        // after remove(k), get(k) = absent, for any value first stored.
        #[test]
        fn remove_then_get_is_always_absent(value: u32) {
            let store = TypedStore::new();
            store.set::<RetryCount>(value);
            proptest::prop_assert_eq!(store.remove::<RetryCount>(), Some(value));
            proptest::prop_assert_eq!(store.get::<RetryCount>(), None);
        }
    }
}
