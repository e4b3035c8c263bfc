//! Injected worker factory and handle contracts.
//!
//! The pool never creates or drives browsers itself: an embedder supplies a
//! [`WorkerFactory`] at construction, and every live session owns one opaque
//! [`WorkerHandle`] with three independently-failing close stages.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Browser engine variant backing a pooled worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
	#[default]
	Chromium,
	Firefox,
	Webkit,
}

impl fmt::Display for WorkerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Chromium => "chromium",
			Self::Firefox => "firefox",
			Self::Webkit => "webkit",
		};
		f.write_str(name)
	}
}

/// Viewport dimensions forwarded to the worker at launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
	pub width: u32,
	pub height: u32,
}

/// Caller-facing launch request; unset fields fall back to configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchRequest {
	/// Browser engine to launch.
	pub kind: Option<WorkerKind>,
	/// Whether the worker should run headless.
	pub headless: Option<bool>,
	/// Initial viewport dimensions.
	pub viewport: Option<Viewport>,
	/// User-agent override.
	pub user_agent: Option<String>,
	/// Launch timeout forwarded to the factory.
	pub timeout_ms: Option<u64>,
	/// Caller-supplied grouping key used for listing/reporting.
	pub owner_tag: Option<String>,
}

impl LaunchRequest {
	/// Sets the target browser engine.
	pub fn with_kind(mut self, kind: WorkerKind) -> Self {
		self.kind = Some(kind);
		self
	}

	/// Sets headless/headful mode.
	pub fn with_headless(mut self, headless: bool) -> Self {
		self.headless = Some(headless);
		self
	}

	/// Sets the initial viewport.
	pub fn with_viewport(mut self, viewport: Viewport) -> Self {
		self.viewport = Some(viewport);
		self
	}

	/// Sets the user-agent override.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	/// Sets the launch timeout in milliseconds.
	pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.timeout_ms = Some(timeout_ms);
		self
	}

	/// Sets the owner grouping tag.
	pub fn with_owner_tag(mut self, tag: impl Into<String>) -> Self {
		self.owner_tag = Some(tag.into());
		self
	}
}

/// Fully resolved launch parameters handed to the factory and echoed back to
/// the caller on admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchParams {
	pub kind: WorkerKind,
	pub headless: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub viewport: Option<Viewport>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,
	pub timeout_ms: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub owner_tag: Option<String>,
}

/// Ordered teardown stages for one worker; lightest sub-resource first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
	Page,
	Context,
	Browser,
}

impl TeardownStep {
	/// All stages in close order.
	pub const ORDER: [TeardownStep; 3] = [Self::Page, Self::Context, Self::Browser];

	/// Stable name used in errors and logs.
	pub fn name(self) -> &'static str {
		match self {
			Self::Page => "page",
			Self::Context => "context",
			Self::Browser => "browser",
		}
	}
}

impl fmt::Display for TeardownStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Opaque handle to one live worker and its sub-resources.
///
/// Each close stage is independently callable; a failed stage leaves the
/// remaining stages attemptable.
#[async_trait]
pub trait WorkerHandle: Send + Sync {
	/// Closes the worker's page.
	async fn close_page(&self) -> anyhow::Result<()>;
	/// Closes the worker's browsing context.
	async fn close_context(&self) -> anyhow::Result<()>;
	/// Shuts down the worker process itself.
	async fn close_browser(&self) -> anyhow::Result<()>;
	/// Whether the underlying worker still appears reachable.
	fn is_live(&self) -> bool;
}

/// Creates workers on behalf of the pool; injected at construction.
#[async_trait]
pub trait WorkerFactory: Send + Sync {
	/// Launches a new worker. Slow, I/O-bound, and allowed to fail; the pool
	/// holds no lock across this call.
	async fn create(&self, params: &LaunchParams) -> anyhow::Result<Box<dyn WorkerHandle>>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn teardown_order_runs_lightest_first() {
		assert_eq!(TeardownStep::ORDER, [TeardownStep::Page, TeardownStep::Context, TeardownStep::Browser]);
	}

	#[test]
	fn worker_kind_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&WorkerKind::Webkit).unwrap(), "\"webkit\"");
		assert_eq!(WorkerKind::Firefox.to_string(), "firefox");
	}

	#[test]
	fn launch_request_builders_round_trip() {
		let request = LaunchRequest::default()
			.with_kind(WorkerKind::Firefox)
			.with_headless(false)
			.with_viewport(Viewport { width: 1280, height: 720 })
			.with_user_agent("bw-test/1.0")
			.with_timeout_ms(5_000)
			.with_owner_tag("team-a");
		assert_eq!(request.kind, Some(WorkerKind::Firefox));
		assert_eq!(request.headless, Some(false));
		assert_eq!(request.viewport, Some(Viewport { width: 1280, height: 720 }));
		assert_eq!(request.user_agent.as_deref(), Some("bw-test/1.0"));
		assert_eq!(request.timeout_ms, Some(5_000));
		assert_eq!(request.owner_tag.as_deref(), Some("team-a"));
	}

	#[test]
	fn launch_request_parses_partial_camel_case_json() {
		let request: LaunchRequest = serde_json::from_str(r#"{"kind":"firefox","ownerTag":"team-b"}"#).unwrap();
		assert_eq!(request.kind, Some(WorkerKind::Firefox));
		assert_eq!(request.owner_tag.as_deref(), Some("team-b"));
		assert!(request.headless.is_none());
	}
}
