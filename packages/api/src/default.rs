//! Process-wide default client
//!
//! Lazily created on first use behind a read-biased lock; replacement and
//! shutdown take the write lock briefly and close the outgoing client.
//! Callers wanting deterministic lifecycles should construct their own
//! [`HttpClient`] and drop it explicitly instead.

use std::sync::RwLock;

use httpc_client::HttpClient;
use once_cell::sync::Lazy;

static DEFAULT_CLIENT: Lazy<RwLock<Option<HttpClient>>> = Lazy::new(|| RwLock::new(None));

/// The shared default client, created with the default configuration on
/// first call. Clones are cheap handles to the same pool.
pub fn default_client() -> HttpClient {
    if let Some(client) = DEFAULT_CLIENT
        .read()
        .expect("default client lock poisoned")
        .as_ref()
    {
        return client.clone();
    }
    let mut slot = DEFAULT_CLIENT
        .write()
        .expect("default client lock poisoned");
    // Double-check: another thread may have initialized while we waited.
    if let Some(client) = slot.as_ref() {
        return client.clone();
    }
    let client = HttpClient::new();
    *slot = Some(client.clone());
    client
}

/// Replace the default client, closing and returning the previous one.
pub fn set_default_client(client: HttpClient) -> Option<HttpClient> {
    let mut slot = DEFAULT_CLIENT
        .write()
        .expect("default client lock poisoned");
    let previous = slot.replace(client);
    if let Some(old) = &previous {
        old.close();
    }
    previous
}

/// Close and drop the default client. The next [`default_client`] call
/// creates a fresh one.
pub fn close_default_client() {
    let mut slot = DEFAULT_CLIENT
        .write()
        .expect("default client lock poisoned");
    if let Some(client) = slot.take() {
        client.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The default client is process state; serialize these tests.
    static TEST_GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn lazily_creates_then_reuses() {
        let _guard = TEST_GUARD.lock().unwrap();
        close_default_client();
        let first = default_client();
        let second = default_client();
        // Same underlying client: closing one closes the other.
        first.close();
        assert!(second.is_closed());
        close_default_client();
    }

    #[test]
    fn replace_closes_previous() {
        let _guard = TEST_GUARD.lock().unwrap();
        close_default_client();
        let original = default_client();
        let replacement = HttpClient::new();
        let returned = set_default_client(replacement.clone()).expect("previous existed");
        assert!(original.is_closed());
        assert!(returned.is_closed());
        assert!(!replacement.is_closed());
        close_default_client();
        assert!(replacement.is_closed());
    }
}
