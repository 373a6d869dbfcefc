//! Keyed get-or-create cache of interview sessions.
//!
//! A session bound to a key is reused as-is until the key is reset; changed
//! settings passed to `get_or_create` are ignored until then.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::gateway::CompletionGateway;
use crate::session::{Session, SessionConfig};

pub const DEFAULT_STORAGE_KEY: &str = "interviewer";

/// Caller-owned key/value storage for sessions. A key may be absent or
/// hold an empty slot; both count as "no session".
pub trait SessionStore {
    fn contains(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<&Session>;

    /// The slot for `key`, inserting an empty one if the key is absent.
    fn slot(&mut self, key: &str) -> &mut Option<Session>;

    fn remove(&mut self, key: &str) -> Option<Session>;
}

impl SessionStore for HashMap<String, Option<Session>> {
    fn contains(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<&Session> {
        HashMap::get(self, key).and_then(Option::as_ref)
    }

    fn slot(&mut self, key: &str) -> &mut Option<Session> {
        self.entry(key.to_string()).or_insert(None)
    }

    fn remove(&mut self, key: &str) -> Option<Session> {
        HashMap::remove(self, key).flatten()
    }
}

impl SessionStore for BTreeMap<String, Option<Session>> {
    fn contains(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<&Session> {
        BTreeMap::get(self, key).and_then(Option::as_ref)
    }

    fn slot(&mut self, key: &str) -> &mut Option<Session> {
        self.entry(key.to_string()).or_insert(None)
    }

    fn remove(&mut self, key: &str) -> Option<Session> {
        BTreeMap::remove(self, key).flatten()
    }
}

/// Builds sessions against one gateway and manages them in a store.
#[derive(Clone)]
pub struct SessionFactory {
    gateway: Arc<dyn CompletionGateway>,
}

impl SessionFactory {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway }
    }

    pub fn create(&self, config: SessionConfig) -> Session {
        Session::new(config, self.gateway.clone())
    }

    pub fn get_or_create<'a, S>(
        &self,
        store: &'a mut S,
        key: &str,
        config: SessionConfig,
    ) -> &'a mut Session
    where
        S: SessionStore + ?Sized,
    {
        let slot = store.slot(key);
        if slot.is_some() {
            tracing::debug!(key, "reusing existing interviewer");
        } else {
            tracing::debug!(key, "creating new interviewer");
        }
        slot.get_or_insert_with(|| self.create(config))
    }

    /// Drop whatever session `key` holds so the next `get_or_create` builds
    /// a fresh one.
    pub fn reset<S>(&self, store: &mut S, key: &str)
    where
        S: SessionStore + ?Sized,
    {
        if store.contains(key) {
            tracing::debug!(key, "removing interviewer");
            store.remove(key);
        }
    }

    /// Get or create the session for `key` and run one turn on it.
    pub async fn answer_turn<S>(
        &self,
        store: &mut S,
        key: &str,
        config: SessionConfig,
        user_text: &str,
        temperature: f32,
    ) -> Result<String, GatewayError>
    where
        S: SessionStore + ?Sized,
    {
        self.get_or_create(store, key, config)
            .turn(user_text, temperature)
            .await
    }
}
