#![allow(dead_code)]

use configkv::config::Config;
use configkv::{ConfigFacade, ConfigRecord, InMemoryKv, InMemoryLabelIndex, KvLabelIndex};

pub type KvFacade = ConfigFacade<InMemoryKv, KvLabelIndex<InMemoryKv>>;
pub type MemFacade = ConfigFacade<InMemoryKv, InMemoryLabelIndex>;

/// Records and labels sharing one backend.
pub fn kv_facade() -> (InMemoryKv, KvFacade) {
    let kv = InMemoryKv::new();
    let facade = ConfigFacade::new(kv.clone(), KvLabelIndex::new(kv.clone()));
    (kv, facade)
}

pub fn mem_facade() -> (InMemoryKv, MemFacade) {
    let kv = InMemoryKv::new();
    let facade = ConfigFacade::new(kv.clone(), InMemoryLabelIndex::new());
    (kv, facade)
}

pub fn config(pairs: &[(&str, i64)]) -> Config {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_yaml::Value::from(*v)))
        .collect()
}

pub fn record(id: &str, replicas: i64) -> ConfigRecord {
    ConfigRecord::new(id, config(&[("replicas", replicas)]))
}
