//! Bounded session pool for heavyweight browser automation workers.
//!
//! This crate admits, tracks, and reclaims expensive browser engine
//! instances under a fixed capacity: admission reclaims idle sessions
//! before rejecting, a background reaper evicts sessions unused beyond a
//! threshold, and teardown is two-tier (graceful closes surface failures,
//! forced closes always leave the registry consistent).
//!
//! The worker itself is injected through [`WorkerFactory`]; the pool only
//! holds opaque [`WorkerHandle`]s and never reaches for ambient state.

/// Pure admission decisions for capacity enforcement.
mod admission;
/// Pool configuration schema and file loading.
pub mod config;
/// Pool error types shared across the session subsystem.
pub mod error;
/// Injected worker factory and handle contracts.
pub mod factory;
/// Session pool orchestration: admission, leasing, teardown, reaping.
pub mod pool;
/// Pure idle-session selection over registry snapshots.
mod reaper;
/// In-memory session registry.
mod registry;
/// Ordered worker teardown with per-step failure capture.
mod teardown;
/// Fake worker factory for exercising pool behavior without browsers.
pub mod testing;

/// Pool tuning knobs and launch defaults.
pub use config::{LaunchDefaults, PoolConfig};
/// Pool error type and result alias.
pub use error::{PoolError, Result};
/// Worker contracts and launch parameter types.
pub use factory::{LaunchParams, LaunchRequest, TeardownStep, Viewport, WorkerFactory, WorkerHandle, WorkerKind};
/// Pool entry points and status types.
pub use pool::{Admission, PoolStatus, SessionLease, SessionPool};
/// Read-only per-session status row.
pub use registry::SessionInfo;
