//! Usage tracking
//!
//! Counters per (date, content type) for successes and, separately, for
//! failures. Counters only ever grow. Every update is written through to the
//! injected [`UsageStore`]; when the store fails the in-memory count is kept
//! and the error is returned to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shared::{component_debug, Component, ContentType};
use tokio::sync::Mutex;

use crate::error::OrchestratorResult;
use crate::traits::UsageStore;

type DailyCounts = BTreeMap<NaiveDate, BTreeMap<ContentType, u64>>;

/// Everything the tracker persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageLedger {
    #[serde(default)]
    pub successes: DailyCounts,
    #[serde(default)]
    pub failures: DailyCounts,
    #[serde(default)]
    pub last_weekly: Option<NaiveDateTime>,
}

impl UsageLedger {
    fn bump(counts: &mut DailyCounts, content_type: ContentType, date: NaiveDate) {
        *counts.entry(date).or_default().entry(content_type).or_insert(0) += 1;
    }
}

/// Read-only view of the counters from a date onwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub since: NaiveDate,
    pub successes: u64,
    pub failures: u64,
    pub by_type: BTreeMap<ContentType, u64>,
    pub by_date: BTreeMap<NaiveDate, u64>,
}

/// Process-wide usage counters
pub struct UsageTracker {
    store: Arc<dyn UsageStore>,
    ledger: Mutex<UsageLedger>,
}

impl UsageTracker {
    /// Load the ledger from the store
    pub async fn initialize(store: Arc<dyn UsageStore>) -> OrchestratorResult<Self> {
        let ledger = store.load().await?;
        component_debug!(
            Component::Usage,
            "📊 Usage ledger loaded ({} day(s) of history)",
            ledger.successes.len()
        );
        Ok(Self {
            store,
            ledger: Mutex::new(ledger),
        })
    }

    pub async fn record_success(&self, content_type: ContentType, date: NaiveDate) -> OrchestratorResult<()> {
        let mut ledger = self.ledger.lock().await;
        UsageLedger::bump(&mut ledger.successes, content_type, date);
        self.store.save(&ledger).await
    }

    /// Count a failed generation; success counters are untouched
    pub async fn record_failure(&self, content_type: ContentType, date: NaiveDate) -> OrchestratorResult<()> {
        let mut ledger = self.ledger.lock().await;
        UsageLedger::bump(&mut ledger.failures, content_type, date);
        self.store.save(&ledger).await
    }

    pub async fn record_weekly_run(&self, at: NaiveDateTime) -> OrchestratorResult<()> {
        let mut ledger = self.ledger.lock().await;
        ledger.last_weekly = Some(at);
        self.store.save(&ledger).await
    }

    pub async fn last_weekly(&self) -> Option<NaiveDateTime> {
        self.ledger.lock().await.last_weekly
    }

    /// Aggregate counters for every date on or after `since`
    pub async fn stats_since(&self, since: NaiveDate) -> UsageSnapshot {
        let ledger = self.ledger.lock().await;

        let mut snapshot = UsageSnapshot {
            since,
            successes: 0,
            failures: 0,
            by_type: BTreeMap::new(),
            by_date: BTreeMap::new(),
        };

        for (date, counts) in ledger.successes.range(since..) {
            for (content_type, count) in counts {
                snapshot.successes += count;
                *snapshot.by_type.entry(*content_type).or_insert(0) += count;
                *snapshot.by_date.entry(*date).or_insert(0) += count;
            }
        }
        snapshot.failures = ledger
            .failures
            .range(since..)
            .flat_map(|(_, counts)| counts.values())
            .sum();

        snapshot
    }
}
