//! Hand-written port doubles shared by the unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drupal_auth_domain::{ApiRequest, ApiResponse};

use crate::ports::{Clock, HttpClient, HttpClientError, StorageError, TokenStorage};

/// Clock frozen at an epoch second until moved.
#[derive(Debug)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn new(epoch_seconds: i64) -> Self {
        Self(AtomicI64::new(epoch_seconds))
    }

    pub fn set(&self, epoch_seconds: i64) {
        self.0.store(epoch_seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0.load(Ordering::SeqCst), 0).unwrap()
    }
}

/// `TokenStorage` over a plain map.
#[derive(Debug, Default)]
pub struct MemoryStorage(Mutex<HashMap<String, String>>);

impl MemoryStorage {
    pub fn insert(&self, key: &str, value: &str) {
        self.0
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.0.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.0.lock().unwrap().remove(key);
        Ok(())
    }
}

/// `TokenStorage` whose `delete` always fails, as on a read-only disk.
#[derive(Debug, Default)]
pub struct UndeletableStorage(MemoryStorage);

#[async_trait]
impl TokenStorage for UndeletableStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.set(key, value).await
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into())
    }
}

type Responder = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, HttpClientError> + Send + Sync>;

/// `HttpClient` that records requests and answers from a closure.
pub struct MockHttp {
    requests: Mutex<Vec<ApiRequest>>,
    responder: Responder,
    delay: Duration,
}

impl MockHttp {
    pub fn new(
        responder: impl Fn(&ApiRequest) -> Result<ApiResponse, HttpClientError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            delay: Duration::ZERO,
        }
    }

    /// Holds every response for `delay` so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of token endpoint calls with the given `grant_type`.
    pub fn grant_calls(&self, grant_type: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| {
                r.form_fields()
                    .iter()
                    .any(|(k, v)| k == "grant_type" && v == grant_type)
            })
            .count()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(request)
    }
}

/// A response with a JSON body.
pub fn json_response(status: u16, body: &serde_json::Value) -> ApiResponse {
    ApiResponse::new(
        status,
        [("Content-Type".to_string(), "application/json".to_string())],
        serde_json::to_vec(body).unwrap(),
    )
}

/// Value of a form field in a request body.
pub fn form_field(request: &ApiRequest, name: &str) -> Option<String> {
    request
        .form_fields()
        .into_iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v)
}
