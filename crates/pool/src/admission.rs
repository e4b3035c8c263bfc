//! Pure admission decisions for capacity enforcement.

/// Outcome of a capacity check against the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdmissionDecision {
	/// A free slot exists; admit directly.
	Admit,
	/// At or above capacity; run a reclamation sweep before deciding.
	Reclaim,
}

/// Decides whether an admission can proceed at the current registry size.
pub(crate) fn check_capacity(size: usize, limit: usize) -> AdmissionDecision {
	if size < limit { AdmissionDecision::Admit } else { AdmissionDecision::Reclaim }
}
