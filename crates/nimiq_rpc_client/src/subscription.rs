//! Registry of active server-push subscriptions.
//!
//! One map from logical subscription name (the RPC method the subscription
//! was established with) to its entry, holding both the server-assigned
//! subscription identifier and the notification handler. Keeping both in a
//! single entry rules out the two maps ever diverging.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use futures::future::BoxFuture;

use crate::RpcClientError;

/// Type-erased handler invoked for every matching push notification.
///
/// The handler receives the raw pushed payload and is responsible for
/// decoding it; decode failures are reported through the returned result
/// and logged by the dispatcher without affecting the connection.
pub type NotificationHandler =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<(), RpcClientError>> + Send + Sync>;

struct SubscriptionEntry {
    /// `None` until the subscribe call has been confirmed by the server.
    server_id: Option<u64>,
    handler: NotificationHandler,
}

#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    entries: Mutex<HashMap<String, SubscriptionEntry>>,
}

impl SubscriptionRegistry {
    /// Stores the handler before the subscribe call is issued, so a push
    /// racing the confirmation still finds its entry.
    pub fn insert_pending(&self, method: &str, handler: NotificationHandler) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).insert(
            method.to_owned(),
            SubscriptionEntry {
                server_id: None,
                handler,
            },
        );
    }

    /// Records the server-assigned subscription identifier, activating the
    /// entry.
    pub fn confirm(&self, method: &str, server_id: u64) {
        if let Some(entry) = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(method)
        {
            entry.server_id = Some(server_id);
        }
    }

    pub fn remove(&self, method: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(method);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the handler for `method` if the entry is active and its
    /// stored identifier matches `server_id`. Pushes carrying a stale or
    /// unknown identifier yield `None` and are dropped by the caller;
    /// they are benign (e.g. leftovers of a replaced subscription).
    pub fn handler_for(&self, method: &str, server_id: u64) -> Option<NotificationHandler> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(method)?;
        if entry.server_id == Some(server_id) {
            Some(entry.handler.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    fn noop_handler() -> NotificationHandler {
        Arc::new(|_payload: serde_json::Value| async { Ok::<_, RpcClientError>(()) }.boxed())
    }

    #[test]
    fn pending_entries_do_not_dispatch() {
        let registry = SubscriptionRegistry::default();
        registry.insert_pending("subscribeForHeadBlockHash", noop_handler());

        assert!(registry.handler_for("subscribeForHeadBlockHash", 1).is_none());
    }

    #[test]
    fn confirmed_entries_dispatch_on_matching_id_only() {
        let registry = SubscriptionRegistry::default();
        registry.insert_pending("subscribeForHeadBlockHash", noop_handler());
        registry.confirm("subscribeForHeadBlockHash", 7);

        assert!(registry.handler_for("subscribeForHeadBlockHash", 7).is_some());
        assert!(registry.handler_for("subscribeForHeadBlockHash", 6).is_none());
        assert!(registry.handler_for("subscribeForHeadBlock", 7).is_none());
    }

    #[test]
    fn resubscribing_replaces_the_stored_id() {
        let registry = SubscriptionRegistry::default();
        registry.insert_pending("subscribeForHeadBlockHash", noop_handler());
        registry.confirm("subscribeForHeadBlockHash", 7);

        registry.insert_pending("subscribeForHeadBlockHash", noop_handler());
        registry.confirm("subscribeForHeadBlockHash", 8);

        assert!(registry.handler_for("subscribeForHeadBlockHash", 7).is_none());
        assert!(registry.handler_for("subscribeForHeadBlockHash", 8).is_some());
    }
}
