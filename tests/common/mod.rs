//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use game_catalog::core::{NetworkResult, StorageResult};
use game_catalog::storage::{CatalogStore, InMemoryCatalogStore, ItemQuery};
use game_catalog::{CatalogItem, CatalogView, ItemId, NetworkError, RemoteSource, StorageError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::{watch, Semaphore};

pub fn halo_and_chess() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new(1, "Halo").with_genre("Shooter"),
        CatalogItem::new(2, "Chess").with_genre("Strategy"),
    ]
}

pub fn titles(items: &[CatalogItem]) -> Vec<String> {
    items.iter().map(|item| item.title.clone()).collect()
}

pub fn ids(items: &[CatalogItem]) -> Vec<ItemId> {
    items.iter().map(|item| item.id).collect()
}

/// Remote source that replays queued responses, then a fixed fallback.
pub struct ScriptedRemote {
    responses: Mutex<VecDeque<NetworkResult<Vec<CatalogItem>>>>,
    fallback: Vec<CatalogItem>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedRemote {
    pub fn returning(items: Vec<CatalogItem>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: items,
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn failing(err: NetworkError) -> Self {
        Self::returning(Vec::new()).then(Err(err))
    }

    /// Queue a one-off response ahead of the fallback
    pub fn then(self, response: NetworkResult<Vec<CatalogItem>>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Every fetch waits for one permit on `gate` before answering
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for ScriptedRemote {
    async fn fetch_catalog(&self) -> NetworkResult<Vec<CatalogItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// In-memory store with switchable failures.
///
/// Once `observe` is given a receiver, every query records the view that
/// was last published at that moment.
pub struct FlakyStore {
    inner: InMemoryCatalogStore,
    fail_query: AtomicBool,
    fail_commit: AtomicBool,
    commits: AtomicUsize,
    observer: OnceLock<watch::Receiver<CatalogView>>,
    seen_at_query: Mutex<Vec<CatalogView>>,
}

impl FlakyStore {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            inner: InMemoryCatalogStore::with_items(items),
            fail_query: AtomicBool::new(false),
            fail_commit: AtomicBool::new(false),
            commits: AtomicUsize::new(0),
            observer: OnceLock::new(),
            seen_at_query: Mutex::new(Vec::new()),
        }
    }

    pub fn observe(&self, rx: watch::Receiver<CatalogView>) {
        self.observer.set(rx).expect("observer already set");
    }

    /// Drain the views recorded at each query
    pub fn take_seen_at_query(&self) -> Vec<CatalogView> {
        std::mem::take(&mut *self.seen_at_query.lock().unwrap())
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_query.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub fn successful_commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<CatalogItem> {
        self.inner.query(&ItemQuery::new()).unwrap()
    }
}

impl CatalogStore for FlakyStore {
    fn query(&self, query: &ItemQuery) -> StorageResult<Vec<CatalogItem>> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(StorageError::Read("injected read failure".to_string()));
        }
        if let Some(rx) = self.observer.get() {
            let published = rx.borrow().clone();
            self.seen_at_query.lock().unwrap().push(published);
        }
        self.inner.query(query)
    }

    fn get(&self, id: ItemId) -> StorageResult<Option<CatalogItem>> {
        self.inner.get(id)
    }

    fn insert(&self, item: CatalogItem) -> StorageResult<()> {
        self.inner.insert(item)
    }

    fn update(&self, item: CatalogItem) -> StorageResult<()> {
        self.inner.update(item)
    }

    fn delete(&self, id: ItemId) -> StorageResult<()> {
        self.inner.delete(id)
    }

    fn commit(&self) -> StorageResult<()> {
        if self.fail_commit.load(Ordering::SeqCst) {
            self.inner.rollback()?;
            return Err(StorageError::Write("injected write failure".to_string()));
        }
        self.inner.commit()?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&self) -> StorageResult<()> {
        self.inner.rollback()
    }
}
