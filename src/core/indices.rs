use hashbrown::HashMap;

use crate::types::RecordId;

/// Secondary index from a key to record ids in append order.
pub type VecIndex<K> = HashMap<K, Vec<RecordId>>;
