// src/snapshot.rs - single-slot snapshot cache with stale fallback
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::errors::ScannerError;
use crate::orchestrator::ScanOrchestrator;
use crate::types::Snapshot;

/// Holds the last successfully computed cycle. The slot is replaced
/// all-or-nothing, so a reader never observes a half-built snapshot, and the
/// refresh mutex keeps concurrent requests from racing duplicate cycles.
pub struct SnapshotCache {
    slot: RwLock<Option<Snapshot>>,
    refresh: Mutex<()>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
            ttl,
        }
    }

    /// Fresh slot if available, otherwise run a full ingestion cycle. On
    /// cycle failure the previous snapshot (however stale) is served with its
    /// original timestamp; with no snapshot at all the failure propagates.
    pub async fn get_snapshot(
        &self,
        orchestrator: &ScanOrchestrator,
    ) -> Result<Snapshot, ScannerError> {
        if let Some(snapshot) = self.fresh().await {
            debug!("📦 [SNAPSHOT] serving fresh snapshot from {}", snapshot.fetched_at);
            return Ok(snapshot);
        }

        let _refreshing = self.refresh.lock().await;
        // another request may have refreshed while we waited
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }

        match orchestrator.run_cycle().await {
            Ok(signals) => {
                let snapshot = Snapshot {
                    fetched_at: Utc::now(),
                    signals,
                };
                *self.slot.write().await = Some(snapshot.clone());
                info!(
                    "✅ [SNAPSHOT] replaced snapshot: {} instruments at {}",
                    snapshot.signals.len(),
                    snapshot.fetched_at
                );
                Ok(snapshot)
            }
            Err(e) => {
                let stale = self.slot.read().await.clone();
                match stale {
                    Some(snapshot) => {
                        warn!(
                            "⚠️ [SNAPSHOT] cycle failed ({}), serving stale data from {}",
                            e, snapshot.fetched_at
                        );
                        Ok(snapshot)
                    }
                    None => Err(e),
                }
            }
        }
    }

    async fn fresh(&self) -> Option<Snapshot> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|s| {
                Utc::now()
                    .signed_duration_since(s.fetched_at)
                    .to_std()
                    .map(|age| age < self.ttl)
                    .unwrap_or(false)
            })
            .cloned()
    }
}
