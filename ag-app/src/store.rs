//! Session object store adapter.
//!
//! The store holds one JSON blob per conversation under
//! `dialogs/<chat_id>.json`. Adapters are dumb byte transports; all
//! mutation semantics live in the session manager.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

pub fn dialog_key(chat_id: i64) -> String {
    format!("dialogs/{chat_id}.json")
}

/// REST object gateway: GET/PUT/DELETE `{base}/{key}` with an optional
/// bearer token. Signing and retry policy belong to the gateway, not here.
#[derive(Clone)]
pub struct HttpObjectStore {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(anyhow!("store base url must be http(s): {base_url:?}"));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            auth_token: None,
        })
    }

    pub fn with_auth_token(mut self, auth_token: Option<String>) -> Self {
        self.auth_token = auth_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned);
        self
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl SessionStore for HttpObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .authorized(self.http.get(self.object_url(key)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!("store get {key:?}: status={}", response.status()));
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let response = self
            .authorized(self.http.put(self.object_url(key)))
            .header("Content-Type", "application/json")
            .body(value)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("store put {key:?}: status={}", response.status()));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .authorized(self.http.delete(self.object_url(key)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(anyhow!("store delete {key:?}: status={}", response.status()));
        }
        Ok(())
    }
}

/// Process-local store for development runs and tests. State does not
/// survive a restart, which is acceptable only where durability is not.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.locked()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.locked()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.locked()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_keys_are_stable_per_chat() {
        assert_eq!(dialog_key(42), "dialogs/42.json");
        assert_eq!(dialog_key(-100123), "dialogs/-100123.json");
    }

    #[test]
    fn http_store_rejects_non_http_base_urls() {
        assert!(HttpObjectStore::new("s3://bucket").is_err());
        assert!(HttpObjectStore::new("https://kv.example.com/v1/").is_ok());
    }

    #[tokio::test]
    async fn memory_store_round_trips_and_deletes() {
        let store = MemoryStore::new();
        assert!(store.get("dialogs/1.json").await.expect("get").is_none());

        store
            .put("dialogs/1.json", b"{}".to_vec())
            .await
            .expect("put");
        assert_eq!(
            store.get("dialogs/1.json").await.expect("get"),
            Some(b"{}".to_vec())
        );

        store.delete("dialogs/1.json").await.expect("delete");
        assert!(store.get("dialogs/1.json").await.expect("get").is_none());
    }
}
