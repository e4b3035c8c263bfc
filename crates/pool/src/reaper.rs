//! Pure idle-session selection over registry snapshots.
//!
//! Eviction is scan-and-reap rather than per-session timers: a periodic
//! sweep (and the admission guard's on-demand sweep) selects sessions idle
//! strictly longer than the threshold from a snapshot, and the caller owns
//! the I/O of actually closing them.

use std::time::Duration;

use tokio::time::Instant;

/// Ids of sessions idle strictly longer than `max_idle` at `now`.
pub(crate) fn select_idle(snapshot: &[(String, Instant)], max_idle: Duration, now: Instant) -> Vec<String> {
	snapshot
		.iter()
		.filter(|(_, last_used)| now.saturating_duration_since(*last_used) > max_idle)
		.map(|(id, _)| id.clone())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn selection_is_strict_at_the_threshold() {
		tokio::time::advance(Duration::from_secs(3600)).await;
		let now = Instant::now();
		let max_idle = Duration::from_millis(1_000);

		let snapshot = vec![
			("over".to_string(), now - Duration::from_millis(1_001)),
			("exact".to_string(), now - Duration::from_millis(1_000)),
			("under".to_string(), now - Duration::from_millis(999)),
			("fresh".to_string(), now),
		];

		assert_eq!(select_idle(&snapshot, max_idle, now), vec!["over".to_string()]);
	}

	#[tokio::test(start_paused = true)]
	async fn future_last_used_is_never_selected() {
		tokio::time::advance(Duration::from_secs(3600)).await;
		let now = Instant::now();
		let snapshot = vec![("ahead".to_string(), now + Duration::from_millis(50))];
		assert!(select_idle(&snapshot, Duration::from_millis(10), now).is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn empty_snapshot_selects_nothing() {
		let now = Instant::now();
		assert!(select_idle(&[], Duration::from_millis(10), now).is_empty());
	}
}
