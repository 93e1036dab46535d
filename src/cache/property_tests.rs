//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the pipelined cache against a sequential LRU model.

use proptest::prelude::*;
use std::collections::HashSet;

use crate::cache::LruCache;

// == Strategies ==
/// Small key space so sets and gets collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    Get { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
    ]
}

// == Reference Model ==
/// Sequential LRU: front is most recently used.
struct Model {
    capacity: usize,
    order: Vec<(String, u32)>,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: Vec::new(),
        }
    }

    fn touch(&mut self, key: &str) -> Option<u32> {
        let index = self.order.iter().position(|(k, _)| k == key)?;
        let entry = self.order.remove(index);
        let value = entry.1;
        self.order.insert(0, entry);
        Some(value)
    }

    fn set(&mut self, key: String, value: u32) {
        if self.touch(&key).is_some() {
            self.order[0].1 = value;
            return;
        }
        self.order.insert(0, (key, value));
        if self.order.len() > self.capacity {
            self.order.pop();
        }
    }

    fn keys(&self) -> Vec<String> {
        self.order.iter().map(|(k, _)| k.clone()).collect()
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Quiescing after every operation makes the pipeline observably identical
    // to a sequential LRU, including the promote-on-overwrite policy.
    #[test]
    fn prop_matches_sequential_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..60)
    ) {
        let rt = runtime();
        rt.block_on(async {
            let cache = LruCache::with_capacity(capacity).unwrap();
            let mut model = Model::new(capacity);

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(key.clone(), value);
                        model.set(key, value);
                    }
                    CacheOp::Get { key } => {
                        let expected = model.touch(&key);
                        prop_assert_eq!(cache.get(&key), expected, "Value mismatch for {}", key);
                    }
                }
                cache.quiesce().await;
                prop_assert_eq!(cache.keys(), model.keys(), "Recency order diverged");
                prop_assert_eq!(cache.len(), model.order.len(), "Table and list disagree");
            }
            Ok(())
        })?;
    }

    // Without intermediate quiescing, the final state still respects capacity
    // and keeps the most recently inserted keys.
    #[test]
    fn prop_capacity_after_burst(
        capacity in 1usize..10,
        keys in prop::collection::vec("[a-z]{1,2}", 1..40)
    ) {
        let rt = runtime();
        rt.block_on(async {
            let cache = LruCache::with_capacity(capacity).unwrap();
            for key in &keys {
                cache.set(key.clone(), ());
            }
            cache.quiesce().await;

            let distinct: HashSet<&String> = keys.iter().collect();
            let expected = distinct.len().min(capacity);
            prop_assert_eq!(cache.len(), expected);
            prop_assert_eq!(cache.keys().len(), expected);

            // Overwrites of still-pending entries are relinked in order, so
            // the survivors are the `expected` most recently written keys.
            let mut survivors = Vec::new();
            for key in keys.iter().rev() {
                if !survivors.contains(key) {
                    survivors.push(key.clone());
                }
                if survivors.len() == expected {
                    break;
                }
            }
            prop_assert_eq!(cache.keys(), survivors);
            Ok(())
        })?;
    }
}
