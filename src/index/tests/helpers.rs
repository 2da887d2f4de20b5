use crate::index::OrdIndex;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber controlled by `RUST_LOG` env var.
/// Safe to call multiple times — only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh index with tracing enabled.
pub fn new_index() -> OrdIndex {
    init_tracing();
    OrdIndex::new()
}

/// Insert every `(key, block)` pair, validating after each call.
pub fn insert_all(index: &mut OrdIndex, pairs: &[(i64, u64)]) {
    for &(key, block) in pairs {
        index.insert(key, block);
        index.validate().expect("invariants after insert");
    }
}

/// Distinct keys currently present, ascending.
pub fn keys_of(index: &OrdIndex) -> Vec<i64> {
    index.keys().collect()
}
