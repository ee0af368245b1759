// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bounded in-memory audit ring with best-effort sink fan-out.
//!
//! The ring holds at most `max_entries` entries, oldest dropped first.
//! A configured sink receives every entry on a spawned task, outside the
//! ring lock, so a slow sink never stalls loggers and a failing sink never
//! fails the request. Sink failures go to the diagnostic channel
//! (`tracing::warn!`) and nowhere else.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

use crate::domain::audit::{AuditAction, AuditEntry, AuditOutcome};

/// Receiver for audit entries: durable storage, forwarding, anything.
///
/// Invoked fire-and-forget; returning an error only produces a
/// diagnostic log line.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, entry: AuditEntry) -> anyhow::Result<()>;
}

/// Audit logger construction options.
#[derive(Clone)]
pub struct AuditConfig {
    /// Ring capacity; the oldest entry is dropped on overflow.
    pub max_entries: usize,

    /// Optional external sink.
    pub sink: Option<Arc<dyn AuditSink>>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            sink: None,
        }
    }
}

impl std::fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditConfig")
            .field("max_entries", &self.max_entries)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

/// Bounded ring of structured security events.
pub struct AuditLogger {
    max_entries: usize,
    entries: Mutex<VecDeque<AuditEntry>>,
    sink: Option<Arc<dyn AuditSink>>,
}

impl AuditLogger {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            max_entries: config.max_entries.max(1),
            entries: Mutex::new(VecDeque::new()),
            sink: config.sink,
        }
    }

    /// Append an entry, evicting the oldest on overflow, then hand a
    /// copy to the sink (if any) on a spawned task.
    ///
    /// Requires a Tokio runtime when a sink is configured.
    pub fn log(&self, entry: AuditEntry) {
        {
            let mut entries = self.entries.lock();
            if entries.len() == self.max_entries {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }

        // Sink runs outside the lock; its failures stay diagnostic.
        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            tokio::spawn(async move {
                let action = entry.action.clone();
                if let Err(e) = sink.emit(entry).await {
                    warn!(action = %action, error = %e, "audit sink failed; entry kept in ring only");
                }
            });
        }
    }

    // --- convenience loggers over the fixed action vocabulary ---

    pub fn auth_success(&self, user_id: &str, session_id: &str) {
        self.log(
            AuditEntry::new(AuditAction::TokenVerified, AuditOutcome::Success)
                .with_user(user_id)
                .with_session(session_id),
        );
    }

    /// `reason` is a machine kind (e.g. `token_expired`); expiry gets its
    /// own action value, every other reason files under `token_invalid`.
    pub fn auth_failure(&self, reason: &str) {
        let action = if reason == "token_expired" {
            AuditAction::TokenExpired
        } else {
            AuditAction::TokenInvalid
        };
        self.log(
            AuditEntry::new(action, AuditOutcome::Failure)
                .with_meta_field("reason", reason.into()),
        );
    }

    pub fn authorization_check(&self, resource: &str, user_id: &str, allowed: bool) {
        let (action, outcome) = if allowed {
            (AuditAction::AuthorizationSucceeded, AuditOutcome::Success)
        } else {
            (AuditAction::AuthorizationFailed, AuditOutcome::Failure)
        };
        self.log(
            AuditEntry::new(action, outcome)
                .with_user(user_id)
                .with_resource(resource),
        );
    }

    pub fn rate_limit_exceeded(&self, key: &str) {
        self.log(
            AuditEntry::new(AuditAction::RateLimitExceeded, AuditOutcome::Failure)
                .with_user(key),
        );
    }

    // --- queries; none of them reorder ---

    /// The last `n` entries, in insertion order.
    pub fn recent(&self, n: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    /// The last `n` entries for `user_id`, in insertion order.
    pub fn by_user(&self, user_id: &str, n: usize) -> Vec<AuditEntry> {
        self.filtered(n, |e| e.user_id.as_deref() == Some(user_id))
    }

    /// The last `n` entries with the given action, in insertion order.
    pub fn by_action(&self, action: &str, n: usize) -> Vec<AuditEntry> {
        self.filtered(n, |e| e.action == action)
    }

    /// The last `n` non-success entries, in insertion order.
    pub fn failed(&self, n: usize) -> Vec<AuditEntry> {
        self.filtered(n, |e| !e.is_success())
    }

    fn filtered(&self, n: usize, pred: impl Fn(&AuditEntry) -> bool) -> Vec<AuditEntry> {
        let entries = self.entries.lock();
        let mut matched: Vec<AuditEntry> = entries.iter().filter(|e| pred(e)).cloned().collect();
        let skip = matched.len().saturating_sub(n);
        matched.drain(..skip);
        matched
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Defensive copy of the whole ring.
    pub fn export(&self) -> Vec<AuditEntry> {
        self.entries.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn entry(action: AuditAction, outcome: AuditOutcome, user: &str) -> AuditEntry {
        AuditEntry::new(action, outcome).with_user(user)
    }

    #[test]
    fn test_ring_overflow_drops_oldest_in_order() {
        let logger = AuditLogger::new(AuditConfig {
            max_entries: 3,
            sink: None,
        });
        for user in ["e1", "e2", "e3", "e4"] {
            logger.log(entry(AuditAction::ToolCall, AuditOutcome::Success, user));
        }

        assert_eq!(logger.entry_count(), 3);
        let recent = logger.recent(10);
        let users: Vec<_> = recent.iter().map(|e| e.user_id.clone().unwrap()).collect();
        assert_eq!(users, ["e2", "e3", "e4"]);
    }

    #[test]
    fn test_queries_filter_without_reordering() {
        let logger = AuditLogger::new(AuditConfig::default());
        logger.log(entry(AuditAction::TokenVerified, AuditOutcome::Success, "a"));
        logger.log(entry(AuditAction::ToolCall, AuditOutcome::Failure, "b"));
        logger.log(entry(AuditAction::ToolCall, AuditOutcome::Success, "a"));
        logger.log(entry(AuditAction::ToolCall, AuditOutcome::Error, "a"));

        let by_a = logger.by_user("a", 10);
        assert_eq!(by_a.len(), 3);
        assert_eq!(by_a[0].action, "token_verified");

        assert_eq!(logger.by_action("tool_call", 10).len(), 3);
        assert_eq!(logger.by_action("tool_call", 2).len(), 2);

        let failed = logger.failed(10);
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].user_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_clear_and_export() {
        let logger = AuditLogger::new(AuditConfig::default());
        logger.log(entry(AuditAction::ToolCall, AuditOutcome::Success, "a"));
        assert_eq!(logger.export().len(), 1);
        logger.clear();
        assert_eq!(logger.entry_count(), 0);
        assert!(logger.export().is_empty());
    }

    struct CountingSink {
        emitted: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AuditSink for CountingSink {
        async fn emit(&self, _entry: AuditEntry) -> anyhow::Result<()> {
            self.emitted.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("sink exploded");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sink_receives_entries() {
        let sink = Arc::new(CountingSink {
            emitted: AtomicUsize::new(0),
            fail: false,
        });
        let logger = AuditLogger::new(AuditConfig {
            max_entries: 10,
            sink: Some(Arc::clone(&sink) as Arc<dyn AuditSink>),
        });

        logger.log(entry(AuditAction::ToolCall, AuditOutcome::Success, "a"));
        logger.log(entry(AuditAction::ToolCall, AuditOutcome::Success, "b"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.emitted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sink_failure_never_reaches_the_caller() {
        let sink = Arc::new(CountingSink {
            emitted: AtomicUsize::new(0),
            fail: true,
        });
        let logger = AuditLogger::new(AuditConfig {
            max_entries: 10,
            sink: Some(Arc::clone(&sink) as Arc<dyn AuditSink>),
        });

        // does not panic, does not error; the entry still lands in the ring
        logger.log(entry(AuditAction::ToolCall, AuditOutcome::Success, "a"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(sink.emitted.load(Ordering::SeqCst), 1);
        assert_eq!(logger.entry_count(), 1);
    }
}
