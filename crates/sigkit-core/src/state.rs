//! Observable state of the signing orchestrator.

use serde::Serialize;
use sigkit_types::SignatureScheme;

/// Lifecycle of the most recent signing attempt.
///
/// `Idle -> AwaitingExternalSigner -> (Signed | Rejected | TimedOut | Failed)`.
/// Terminal states stay visible until the next attempt starts. Requests that
/// fail before the signer is prompted (schema errors, unsupported scheme)
/// also end in `Failed`. An attempt whose caller stops waiting goes back to
/// `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SigningState {
	Idle,
	AwaitingExternalSigner { scheme: SignatureScheme },
	Signed { scheme: SignatureScheme },
	Rejected { reason: String },
	TimedOut,
	Failed { reason: String },
}

impl SigningState {
	/// Whether an attempt is currently waiting on the signer.
	pub fn is_awaiting(&self) -> bool {
		matches!(self, SigningState::AwaitingExternalSigner { .. })
	}

	pub fn is_terminal(&self) -> bool {
		!matches!(
			self,
			SigningState::Idle | SigningState::AwaitingExternalSigner { .. }
		)
	}
}
