//! Scriptable upstream data source

use self_healing_cache::BoxError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-process upstream whose failures can be scripted per test
#[derive(Debug, Default)]
pub struct ScriptedUpstream {
    calls: AtomicUsize,
    failures_remaining: Mutex<HashMap<String, usize>>,
    down: AtomicBool,
    missing: Mutex<Vec<String>>,
}

impl ScriptedUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `times` fetches of `key`
    pub fn fail_next(&self, key: &str, times: usize) {
        self.failures_remaining
            .lock()
            .unwrap()
            .insert(key.to_string(), times);
    }

    /// Fail every fetch until switched back
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Report `key` as absent upstream
    pub fn remove(&self, key: &str) {
        self.missing.lock().unwrap().push(key.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fetch(&self, key: &str) -> Result<Option<String>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.down.load(Ordering::SeqCst) {
            return Err(format!("upstream down for {key}").into());
        }

        if let Some(remaining) = self.failures_remaining.lock().unwrap().get_mut(key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(format!("transient failure for {key}").into());
            }
        }

        if self.missing.lock().unwrap().iter().any(|missing| missing == key) {
            return Ok(None);
        }

        Ok(Some(format!("fresh:{key}")))
    }
}

/// Refresh closure bound to a scripted upstream
pub fn refresh_from(
    upstream: &Arc<ScriptedUpstream>,
) -> impl Fn(String) -> std::future::Ready<Result<Option<String>, BoxError>> + Send + Sync + 'static
{
    let upstream = upstream.clone();
    move |key: String| std::future::ready(upstream.fetch(&key))
}
