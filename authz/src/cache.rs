//! Per-request memoization of rule verdicts.
//!
//! A [`RuleEvaluationCache`] lives exactly as long as one request. It is
//! never shared between requests, so a verdict computed for one actor can
//! never answer for another.

use crate::types::Verdict;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// How a leaf rule's verdict may be reused within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Depends only on the actor: one entry per rule per request.
    Contextual,
    /// Depends on the arguments and parent too: one entry per distinct
    /// `(args, parent)` pair.
    Strict,
    /// Always re-evaluated.
    NoCache,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub rule: String,
    /// `None` for contextual entries, the serialised `(args, parent)` for
    /// strict ones.
    pub scope: Option<String>,
}

impl CacheKey {
    pub fn contextual(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            scope: None,
        }
    }

    pub fn strict(rule: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            scope: Some(scope.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Verdict cache for the rules evaluated during one request.
///
/// Concurrent `race` branches write through the mutex, so entries are
/// inserted one at a time. Only `Allow` and `Deny` are stored; an `Error`
/// is re-evaluated on the next lookup.
#[derive(Debug, Default)]
pub struct RuleEvaluationCache {
    verdicts: Mutex<HashMap<CacheKey, Verdict>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RuleEvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Verdict> {
        let verdict = self.verdicts.lock().await.get(key).cloned();
        let counter = if verdict.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        verdict
    }

    /// Stores a verdict. Errors are ignored.
    pub async fn insert(&self, key: CacheKey, verdict: Verdict) {
        if matches!(verdict, Verdict::Error(_)) {
            return;
        }
        self.verdicts.lock().await.insert(key, verdict);
    }

    pub async fn len(&self) -> usize {
        self.verdicts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.verdicts.lock().await.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
