use crate::backend::Backend;
use crate::config::BackendConfig;
use crate::errors::FsResult;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use tracing::debug;

struct PooledBackend {
    backend: Arc<Backend>,
    ref_count: usize,
}

/// The only process-wide mutable state: backends keyed by
/// `userId:kind[:host:port]`, reference-counted. None of these operations
/// suspend; the map is guarded by a plain mutex.
static POOL: LazyLock<Mutex<HashMap<String, PooledBackend>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Acquire a backend for this config, creating it on first use and
/// incrementing its reference count otherwise.
pub fn acquire(config: &BackendConfig) -> FsResult<Arc<Backend>> {
    config.validate()?;
    let key = config.pool_key();

    let mut pool = POOL.lock().expect("backend pool lock");
    if let Some(pooled) = pool.get_mut(&key) {
        pooled.ref_count += 1;
        debug!("pool hit for {} (refs={})", key, pooled.ref_count);
        return Ok(pooled.backend.clone());
    }

    let backend = Arc::new(Backend::new(config.clone())?);
    debug!("pool created backend for {}", key);
    pool.insert(
        key,
        PooledBackend {
            backend: backend.clone(),
            ref_count: 1,
        },
    );
    Ok(backend)
}

/// Release one reference. The last release destroys the backend and removes
/// it from the pool. Returns true when the backend was destroyed.
pub fn release(key: &str) -> bool {
    let mut pool = POOL.lock().expect("backend pool lock");
    let Some(pooled) = pool.get_mut(key) else {
        return false;
    };

    pooled.ref_count = pooled.ref_count.saturating_sub(1);
    if pooled.ref_count > 0 {
        debug!("pool release for {} (refs={})", key, pooled.ref_count);
        return false;
    }

    if let Some(pooled) = pool.remove(key) {
        pooled.backend.destroy();
    }
    debug!("pool destroyed backend for {}", key);
    true
}

/// All pooled backends belonging to a user.
pub fn user_backends(user_id: &str) -> Vec<Arc<Backend>> {
    let prefix = format!("{}:", user_id);
    let pool = POOL.lock().expect("backend pool lock");
    pool.iter()
        .filter(|(key, _)| key.starts_with(&prefix))
        .map(|(_, pooled)| pooled.backend.clone())
        .collect()
}

/// Destroy and remove every backend belonging to a user, regardless of
/// outstanding references. Returns how many backends were destroyed.
pub fn cleanup_user(user_id: &str) -> usize {
    let prefix = format!("{}:", user_id);
    let mut pool = POOL.lock().expect("backend pool lock");
    let keys: Vec<String> = pool
        .keys()
        .filter(|key| key.starts_with(&prefix))
        .cloned()
        .collect();
    for key in &keys {
        if let Some(pooled) = pool.remove(key) {
            pooled.backend.destroy();
        }
    }
    keys.len()
}

/// Current reference count for a pool key. Mainly for diagnostics and tests.
pub fn ref_count(key: &str) -> usize {
    let pool = POOL.lock().expect("backend pool lock");
    pool.get(key).map_or(0, |pooled| pooled.ref_count)
}

#[cfg(test)]
mod tests;
