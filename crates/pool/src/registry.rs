//! In-memory session registry: the single source of truth for live workers.
//!
//! A single mutex guards the whole map. Every operation is O(1) metadata
//! work; the slow parts of the session lifecycle (factory calls, teardown)
//! happen outside the lock. Absence is represented with `Option`, never
//! raised — higher layers decide whether absence is a caller error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

use crate::factory::{LaunchParams, WorkerHandle, WorkerKind};

/// One tracked worker session.
pub(crate) struct SessionRecord {
	/// Process-wide-unique identifier, immutable, never reused.
	pub id: String,
	/// The opaque worker; leases clone the `Arc`, teardown paths consume it.
	pub handle: Arc<dyn WorkerHandle>,
	/// Effective launch parameters echoed at admission.
	pub params: LaunchParams,
	pub created_at: Instant,
	/// Wall-clock creation time, captured once for status reporting.
	pub created_unix_ms: u64,
	/// Sole input to idle eviction; refreshed by `touch`.
	pub last_used: Instant,
	/// Reported to callers; set once at creation and never interpreted here.
	pub active: bool,
}

impl SessionRecord {
	/// Builds a fresh record with `created_at == last_used == now`.
	pub fn new(id: String, handle: Arc<dyn WorkerHandle>, params: LaunchParams) -> Self {
		let now = Instant::now();
		let created_unix_ms = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|elapsed| elapsed.as_millis() as u64)
			.unwrap_or(0);
		Self {
			id,
			handle,
			params,
			created_at: now,
			created_unix_ms,
			last_used: now,
			active: true,
		}
	}

	fn info(&self) -> SessionInfo {
		let since_create_ms = self.last_used.saturating_duration_since(self.created_at).as_millis() as u64;
		SessionInfo {
			id: self.id.clone(),
			owner_tag: self.params.owner_tag.clone(),
			kind: self.params.kind,
			created_at_ms: self.created_unix_ms,
			last_used_ms: self.created_unix_ms + since_create_ms,
			idle_ms: self.last_used.elapsed().as_millis() as u64,
			active: self.active,
		}
	}
}

/// Read-only status row describing one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
	pub id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub owner_tag: Option<String>,
	pub kind: WorkerKind,
	pub created_at_ms: u64,
	pub last_used_ms: u64,
	pub idle_ms: u64,
	pub active: bool,
}

/// Keyed store of session records.
#[derive(Default)]
pub(crate) struct SessionRegistry {
	sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl SessionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a record; the caller guarantees the id is unique.
	pub fn insert(&self, record: SessionRecord) {
		self.sessions.lock().insert(record.id.clone(), record);
	}

	/// Side-effect-free handle lookup; callers that use the session must
	/// touch it themselves so status queries stay read-only.
	pub fn handle(&self, id: &str) -> Option<Arc<dyn WorkerHandle>> {
		self.sessions.lock().get(id).map(|record| Arc::clone(&record.handle))
	}

	/// Refreshes idle accounting; no-op for unknown ids.
	pub fn touch(&self, id: &str) {
		if let Some(record) = self.sessions.lock().get_mut(id) {
			record.last_used = Instant::now();
		}
	}

	/// Removes and returns a record for teardown.
	pub fn remove(&self, id: &str) -> Option<SessionRecord> {
		self.sessions.lock().remove(id)
	}

	/// Removes `id` only when still idle beyond `max_idle`.
	///
	/// Sweeps re-check under the lock so a session touched after the scan
	/// snapshot survives.
	pub fn remove_if_idle(&self, id: &str, max_idle: Duration) -> Option<SessionRecord> {
		let mut sessions = self.sessions.lock();
		let record = sessions.get(id)?;
		if Instant::now().saturating_duration_since(record.last_used) > max_idle {
			sessions.remove(id)
		} else {
			None
		}
	}

	pub fn len(&self) -> usize {
		self.sessions.lock().len()
	}

	/// Status snapshot of every session.
	pub fn snapshot(&self) -> Vec<SessionInfo> {
		self.sessions.lock().values().map(SessionRecord::info).collect()
	}

	/// Consistent `(id, last_used)` copy used by idle selection and bulk
	/// cleanup iteration.
	pub fn idle_snapshot(&self) -> Vec<(String, Instant)> {
		self.sessions.lock().values().map(|record| (record.id.clone(), record.last_used)).collect()
	}

	/// Drops every record without teardown; bulk cleanup calls this last.
	pub fn clear(&self) {
		self.sessions.lock().clear();
	}
}

#[cfg(test)]
mod tests {
	use async_trait::async_trait;

	use super::*;
	use crate::config::PoolConfig;
	use crate::factory::LaunchRequest;

	struct NullHandle;

	#[async_trait]
	impl WorkerHandle for NullHandle {
		async fn close_page(&self) -> anyhow::Result<()> {
			Ok(())
		}

		async fn close_context(&self) -> anyhow::Result<()> {
			Ok(())
		}

		async fn close_browser(&self) -> anyhow::Result<()> {
			Ok(())
		}

		fn is_live(&self) -> bool {
			true
		}
	}

	fn record(id: &str) -> SessionRecord {
		let params = PoolConfig::default().effective_params(LaunchRequest::default().with_owner_tag("team-a"));
		SessionRecord::new(id.to_string(), Arc::new(NullHandle), params)
	}

	#[tokio::test]
	async fn insert_lookup_remove_round_trip() {
		let registry = SessionRegistry::new();
		assert_eq!(registry.len(), 0);

		registry.insert(record("a"));
		assert_eq!(registry.len(), 1);
		assert!(registry.handle("a").is_some());
		assert!(registry.handle("b").is_none());

		let removed = registry.remove("a").expect("record should be removed");
		assert_eq!(removed.id, "a");
		assert_eq!(registry.len(), 0);
		assert!(registry.remove("a").is_none(), "ids are permanently invalid after removal");
	}

	#[tokio::test(start_paused = true)]
	async fn touch_refreshes_last_used_and_keeps_invariant() {
		let registry = SessionRegistry::new();
		registry.insert(record("a"));

		tokio::time::advance(Duration::from_millis(500)).await;
		registry.touch("a");
		registry.touch("missing");

		let snapshot = registry.snapshot();
		assert_eq!(snapshot[0].idle_ms, 0);
		assert!(snapshot[0].last_used_ms >= snapshot[0].created_at_ms);
	}

	#[tokio::test(start_paused = true)]
	async fn remove_if_idle_spares_recently_touched_sessions() {
		let registry = SessionRegistry::new();
		registry.insert(record("a"));
		registry.insert(record("b"));

		tokio::time::advance(Duration::from_millis(1_001)).await;
		registry.touch("b");

		let max_idle = Duration::from_millis(1_000);
		assert!(registry.remove_if_idle("a", max_idle).is_some());
		assert!(registry.remove_if_idle("b", max_idle).is_none());
		assert_eq!(registry.len(), 1);
	}

	#[tokio::test]
	async fn snapshot_reports_owner_tag_and_active_flag() {
		let registry = SessionRegistry::new();
		registry.insert(record("a"));

		let snapshot = registry.snapshot();
		assert_eq!(snapshot.len(), 1);
		assert_eq!(snapshot[0].owner_tag.as_deref(), Some("team-a"));
		assert!(snapshot[0].active);

		registry.clear();
		assert_eq!(registry.len(), 0);
	}
}
