//! Session pool orchestration: admission, leasing, teardown, and reaping.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::admission::{AdmissionDecision, check_capacity};
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::factory::{LaunchParams, LaunchRequest, WorkerFactory, WorkerHandle};
use crate::reaper::select_idle;
use crate::registry::{SessionInfo, SessionRecord, SessionRegistry};
use crate::teardown;

/// Result of a granted admission: the session id plus the echoed effective
/// launch parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admission {
	pub id: String,
	pub params: LaunchParams,
}

/// Point-in-time view of the pool for operator introspection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
	pub size: usize,
	pub capacity: usize,
	pub sessions: Vec<SessionInfo>,
}

/// Checked-out session handle.
///
/// Idle accounting is refreshed on acquisition and again on drop, so a slow
/// automation operation counts from its end rather than its start.
pub struct SessionLease {
	id: String,
	handle: Arc<dyn WorkerHandle>,
	registry: Arc<SessionRegistry>,
}

impl SessionLease {
	/// Session id this lease refers to.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// The worker handle for performing automation operations.
	pub fn handle(&self) -> &Arc<dyn WorkerHandle> {
		&self.handle
	}
}

impl Drop for SessionLease {
	fn drop(&mut self) {
		self.registry.touch(&self.id);
	}
}

struct PoolInner {
	config: PoolConfig,
	factory: Arc<dyn WorkerFactory>,
	registry: Arc<SessionRegistry>,
	reaper: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

/// Bounded pool of heavyweight browser workers.
pub struct SessionPool {
	inner: Arc<PoolInner>,
}

impl SessionPool {
	/// Creates a pool with the given configuration and injected factory.
	pub fn new(config: PoolConfig, factory: Arc<dyn WorkerFactory>) -> Result<Self> {
		config.validate()?;
		Ok(Self {
			inner: Arc::new(PoolInner {
				config,
				factory,
				registry: Arc::new(SessionRegistry::new()),
				reaper: parking_lot::Mutex::new(None),
			}),
		})
	}

	/// Starts the periodic idle reaper; calling again is a no-op.
	pub fn initialize(&self) {
		let mut slot = self.inner.reaper.lock();
		if slot.is_some() {
			return;
		}

		let inner = Arc::clone(&self.inner);
		let period = inner.config.cleanup_interval();
		*slot = Some(tokio::spawn(async move {
			let mut ticker = interval(period);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			// The first tick completes immediately; the first sweep should
			// wait a full period.
			ticker.tick().await;
			loop {
				ticker.tick().await;
				let reaped = reap_idle(&inner).await;
				if reaped > 0 {
					debug!(target = "bw.pool", reaped, "periodic sweep reclaimed idle sessions");
				}
			}
		}));
		debug!(
			target = "bw.pool",
			interval_ms = self.inner.config.cleanup_interval_ms,
			max_idle_ms = self.inner.config.max_idle_time_ms,
			"idle reaper started"
		);
	}

	/// Admits a new session, launching a worker through the factory.
	///
	/// The capacity check reclaims idle sessions before rejecting. No lock
	/// is held across the factory call, so concurrent admissions may
	/// transiently overshoot the limit by in-flight launches.
	pub async fn launch(&self, request: LaunchRequest) -> Result<Admission> {
		self.ensure_capacity().await?;

		let params = self.inner.config.effective_params(request);
		let handle = match self.inner.factory.create(&params).await {
			Ok(handle) => handle,
			Err(source) => {
				return Err(PoolError::Factory {
					kind: params.kind,
					in_use: self.inner.registry.len(),
					limit: self.inner.config.max_sessions,
					source,
				});
			}
		};

		let id = Uuid::new_v4().to_string();
		self.inner.registry.insert(SessionRecord::new(id.clone(), Arc::from(handle), params.clone()));
		info!(
			target = "bw.pool",
			session = %id,
			kind = %params.kind,
			headless = params.headless,
			in_use = self.inner.registry.len(),
			limit = self.inner.config.max_sessions,
			"session admitted"
		);
		Ok(Admission { id, params })
	}

	/// Checks out a session handle, failing when the id is unknown.
	pub fn lease(&self, id: &str) -> Result<SessionLease> {
		let Some(handle) = self.inner.registry.handle(id) else {
			return Err(PoolError::SessionNotFound { id: id.to_string() });
		};
		self.inner.registry.touch(id);
		Ok(SessionLease {
			id: id.to_string(),
			handle,
			registry: Arc::clone(&self.inner.registry),
		})
	}

	/// Refreshes idle accounting for a session; unknown ids are ignored.
	pub fn touch(&self, id: &str) {
		self.inner.registry.touch(id);
	}

	/// Gracefully closes a session, surfacing the last failing teardown step.
	///
	/// On failure the record is restored so a later forced close or reaper
	/// sweep can resolve the partially torn-down worker.
	pub async fn close(&self, id: &str) -> Result<()> {
		let Some(record) = self.inner.registry.remove(id) else {
			return Err(PoolError::SessionNotFound { id: id.to_string() });
		};

		let mut failures = teardown::run(&record.handle).await;
		let Some(failure) = failures.pop() else {
			info!(target = "bw.pool", session = %id, "session closed");
			return Ok(());
		};

		self.inner.registry.insert(record);
		warn!(
			target = "bw.pool",
			session = %id,
			step = %failure.step,
			error = %failure.error,
			"graceful close failed; session retained for forced cleanup"
		);
		Err(PoolError::Teardown {
			id: id.to_string(),
			step: failure.step,
			source: failure.error,
		})
	}

	/// Forcibly closes a session; teardown failures are logged and swallowed
	/// and the record is always removed.
	pub async fn force_close(&self, id: &str) -> Result<()> {
		let Some(record) = self.inner.registry.remove(id) else {
			return Err(PoolError::SessionNotFound { id: id.to_string() });
		};
		force_teardown(&record).await;
		info!(target = "bw.pool", session = %id, "session force-closed");
		Ok(())
	}

	/// Runs one idle sweep immediately; returns the number of sessions
	/// reclaimed.
	pub async fn reap_idle(&self) -> usize {
		reap_idle(&self.inner).await
	}

	/// Read-only snapshot of pool occupancy and per-session metadata.
	pub fn status(&self) -> PoolStatus {
		PoolStatus {
			size: self.inner.registry.len(),
			capacity: self.inner.config.max_sessions,
			sessions: self.inner.registry.snapshot(),
		}
	}

	/// Stops the reaper and force-closes every session; calling again is a
	/// no-op.
	///
	/// Teardowns are awaited independently so one failing worker never
	/// blocks the rest, and the registry is cleared unconditionally.
	pub async fn cleanup(&self) {
		if let Some(task) = self.inner.reaper.lock().take() {
			task.abort();
		}

		let ids: Vec<String> = self.inner.registry.idle_snapshot().into_iter().map(|(id, _)| id).collect();
		let teardowns = ids.iter().map(|id| async {
			if let Some(record) = self.inner.registry.remove(id) {
				force_teardown(&record).await;
			}
		});
		join_all(teardowns).await;

		self.inner.registry.clear();
		info!(target = "bw.pool", closed = ids.len(), "pool cleanup complete");
	}

	async fn ensure_capacity(&self) -> Result<()> {
		let limit = self.inner.config.max_sessions;
		if check_capacity(self.inner.registry.len(), limit) == AdmissionDecision::Admit {
			return Ok(());
		}

		// At capacity: reclaim idle sessions before rejecting.
		let reaped = reap_idle(&self.inner).await;
		if reaped > 0 {
			debug!(target = "bw.pool", reaped, "on-demand sweep freed slots for admission");
		}

		if check_capacity(self.inner.registry.len(), limit) == AdmissionDecision::Admit {
			Ok(())
		} else {
			Err(PoolError::Exhausted { limit })
		}
	}
}

/// One scan-and-reap pass over the registry.
async fn reap_idle(inner: &PoolInner) -> usize {
	let max_idle = inner.config.max_idle_time();
	let snapshot = inner.registry.idle_snapshot();
	let idle = select_idle(&snapshot, max_idle, Instant::now());

	let mut reaped = 0;
	for id in idle {
		// Sessions touched or closed since the snapshot are skipped.
		let Some(record) = inner.registry.remove_if_idle(&id, max_idle) else {
			continue;
		};
		info!(target = "bw.pool", session = %id, "reclaiming idle session");
		force_teardown(&record).await;
		reaped += 1;
	}
	reaped
}

async fn force_teardown(record: &SessionRecord) {
	let failures = teardown::run(&record.handle).await;
	teardown::log_swallowed(&record.id, &failures);
}
