//! Test doubles and common utilities for challenge contract tests
//!
//! The mock provider wraps [`MemoryProvider`] for record bookkeeping and adds
//! call recording and failure injection.

#![allow(dead_code)]

use dns01_core::config::{ChallengeConfig, ProviderConfig};
use dns01_core::error::{Error, Result};
use dns01_core::traits::{CreateResult, DeleteResult, DnsProvider};
use dns01_core::{ChallengeEvent, ChallengeManager, MemoryProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Kind of failure a mock operation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Credentials rejected
    Authentication,
    /// Remote service failure (e.g. HTTP 503)
    Provider,
}

impl MockFailure {
    fn to_error(self) -> Error {
        match self {
            MockFailure::Authentication => Error::auth("mock credentials rejected"),
            MockFailure::Provider => Error::provider("mock", "service unavailable (503)"),
        }
    }
}

/// A recorded mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: &'static str,
    pub zone: String,
    pub subdomain: String,
    pub value: String,
}

#[derive(Debug, Default)]
struct Failures {
    list: Option<MockFailure>,
    create: Option<MockFailure>,
    delete: Option<MockFailure>,
}

/// A mock DnsProvider that tracks calls
///
/// Clones share records, counters, and failure settings, so a test can
/// hand one clone to the manager and inspect another.
#[derive(Clone)]
pub struct MockDnsProvider {
    inner: MemoryProvider,
    list_call_count: Arc<AtomicUsize>,
    create_call_count: Arc<AtomicUsize>,
    delete_call_count: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    failures: Arc<Mutex<Failures>>,
}

impl MockDnsProvider {
    pub fn new(zones: &[&str]) -> Self {
        Self {
            inner: MemoryProvider::new(zones.iter().copied()),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            create_call_count: Arc::new(AtomicUsize::new(0)),
            delete_call_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Failures::default())),
        }
    }

    /// Make every operation fail
    pub fn fail_all(&self, failure: MockFailure) {
        let mut failures = self.failures.lock().unwrap();
        failures.list = Some(failure);
        failures.create = Some(failure);
        failures.delete = Some(failure);
    }

    /// Make create_txt_record fail
    pub fn fail_create(&self, failure: MockFailure) {
        self.failures.lock().unwrap().create = Some(failure);
    }

    /// Make delete_txt_record fail
    pub fn fail_delete(&self, failure: MockFailure) {
        self.failures.lock().unwrap().delete = Some(failure);
    }

    /// Clear all injected failures
    pub fn heal(&self) {
        *self.failures.lock().unwrap() = Failures::default();
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn create_call_count(&self) -> usize {
        self.create_call_count.load(Ordering::SeqCst)
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_call_count.load(Ordering::SeqCst)
    }

    /// Mutating calls in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Current `(subdomain, value)` records in a zone
    pub async fn records(&self, zone: &str) -> Vec<(String, String)> {
        self.inner.records(zone).await
    }

    /// Insert a record directly, bypassing counters
    pub async fn seed(&self, zone: &str, subdomain: &str, value: &str) {
        self.inner
            .create_txt_record(zone, subdomain, value)
            .await
            .unwrap();
    }

    fn record(&self, operation: &'static str, zone: &str, subdomain: &str, value: &str) {
        self.calls.lock().unwrap().push(RecordedCall {
            operation,
            zone: zone.to_string(),
            subdomain: subdomain.to_string(),
            value: value.to_string(),
        });
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones(&self) -> Result<Vec<String>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.failures.lock().unwrap().list {
            return Err(failure.to_error());
        }
        self.inner.list_zones().await
    }

    async fn create_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        value: &str,
    ) -> Result<CreateResult> {
        self.create_call_count.fetch_add(1, Ordering::SeqCst);
        self.record("create", zone, subdomain, value);
        if let Some(failure) = self.failures.lock().unwrap().create {
            return Err(failure.to_error());
        }
        self.inner.create_txt_record(zone, subdomain, value).await
    }

    async fn delete_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        value: &str,
    ) -> Result<DeleteResult> {
        self.delete_call_count.fetch_add(1, Ordering::SeqCst);
        self.record("delete", zone, subdomain, value);
        if let Some(failure) = self.failures.lock().unwrap().delete {
            return Err(failure.to_error());
        }
        self.inner.delete_txt_record(zone, subdomain, value).await
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal ChallengeConfig for testing
pub fn minimal_config(propagation_seconds: u64) -> ChallengeConfig {
    ChallengeConfig {
        provider: ProviderConfig::Memory {
            zones: vec!["example.com".to_string()],
        },
        propagation_seconds,
        event_channel_capacity: 100,
    }
}

/// Build a manager over a clone of `provider`
pub fn manager_with(
    provider: &MockDnsProvider,
    propagation_seconds: u64,
) -> (ChallengeManager, mpsc::Receiver<ChallengeEvent>) {
    ChallengeManager::new(
        Box::new(provider.clone()),
        minimal_config(propagation_seconds),
    )
    .expect("manager construction succeeds")
}
