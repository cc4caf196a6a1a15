//! Signing orchestrator.
//!
//! Runs one signing attempt at a time against the configured external
//! signer. A second request arriving while the first is still waiting on the
//! signer is refused with [`SigningError::Busy`] rather than queued, since a
//! wallet shows one prompt at a time.

use crate::{SignedMessage, SigningError, SigningRequest, SigningState};
use sigkit_codec::{normalize, serialize};
use sigkit_digest::SigningDigest;
use sigkit_signer::SignerService;
use sigkit_types::{SignatureScheme, SignerCapabilities};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tracing::instrument;

/// Coordinates digest construction, the signer call and signature normalization.
pub struct SigningOrchestrator {
	/// Signer that holds the key.
	signer: Arc<SignerService>,
	/// What the signer is able to do.
	capabilities: SignerCapabilities,
	/// Single permit; held for the whole attempt.
	gate: Semaphore,
	/// Latest state, observable through [`SigningOrchestrator::subscribe`].
	state: watch::Sender<SigningState>,
}

impl SigningOrchestrator {
	pub fn new(signer: Arc<SignerService>, capabilities: SignerCapabilities) -> Self {
		let (state, _) = watch::channel(SigningState::Idle);
		Self {
			signer,
			capabilities,
			gate: Semaphore::new(1),
			state,
		}
	}

	pub fn signer(&self) -> &Arc<SignerService> {
		&self.signer
	}

	pub fn capabilities(&self) -> SignerCapabilities {
		self.capabilities
	}

	/// Current state of the most recent attempt.
	pub fn state(&self) -> SigningState {
		self.state.borrow().clone()
	}

	/// Receiver notified on every state transition.
	pub fn subscribe(&self) -> watch::Receiver<SigningState> {
		self.state.subscribe()
	}

	/// Runs a signing attempt.
	///
	/// The digest is computed before the signer is prompted, so schema errors
	/// never reach the key holder. The wait for the signer is bounded by
	/// `timeout`; on expiry the attempt ends with `TimedOut` and the signer's
	/// late answer, if any, is dropped. Nothing is retried.
	///
	/// Bytes that come back from the signer but fail normalization leave the
	/// attempt `Signed` and are returned as [`SigningError::MalformedSignature`].
	/// If the returned future is dropped before it completes, the state goes
	/// back to `Idle`.
	#[instrument(skip_all, fields(scheme = %request.scheme()))]
	pub async fn sign(
		&self,
		request: &SigningRequest,
		timeout: Duration,
	) -> Result<SignedMessage, SigningError> {
		let _permit = self.gate.try_acquire().map_err(|_| {
			tracing::warn!("Signing request refused, another attempt is awaiting the signer");
			SigningError::Busy
		})?;
		// Declared after the permit so the state is published before the gate frees.
		let mut attempt = AttemptGuard {
			state: &self.state,
			outcome: None,
		};

		let result = self.run(request, timeout).await;

		attempt.outcome = Some(match &result {
			Ok(signed) => SigningState::Signed {
				scheme: signed.scheme,
			},
			Err(SigningError::MalformedSignature(_)) => SigningState::Signed {
				scheme: request.scheme(),
			},
			Err(SigningError::Rejected(reason)) => SigningState::Rejected {
				reason: reason.clone(),
			},
			Err(SigningError::TimedOut(_)) => SigningState::TimedOut,
			Err(e) => SigningState::Failed {
				reason: e.to_string(),
			},
		});

		result
	}

	async fn run(
		&self,
		request: &SigningRequest,
		timeout: Duration,
	) -> Result<SignedMessage, SigningError> {
		let scheme = request.scheme();
		if scheme == SignatureScheme::AuthorizationDelegation
			&& !self.capabilities.supports_authorization_delegation
		{
			tracing::warn!("Signer does not support authorization delegation");
			return Err(SigningError::Unsupported(scheme));
		}

		let digest = match request {
			SigningRequest::StructuredData(data) => SigningDigest::structured(data)?,
			SigningRequest::AuthorizationDelegation(authorization) => {
				SigningDigest::authorization(authorization)
			},
		};

		self.state
			.send_replace(SigningState::AwaitingExternalSigner { scheme });
		tracing::info!(digest = %digest.digest, "Waiting for external signer");

		let outcome = match &digest.structured {
			Some(data) => tokio::time::timeout(timeout, self.signer.sign_structured_data(data)).await,
			None => tokio::time::timeout(timeout, self.signer.sign_digest(&digest.digest)).await,
		};

		let raw = match outcome {
			Ok(Ok(raw)) => raw,
			Ok(Err(e)) => {
				tracing::warn!(error = %e, "Signer returned an error");
				return Err(e.into());
			},
			Err(_) => {
				tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Signer timed out");
				return Err(SigningError::TimedOut(timeout));
			},
		};

		let signature = normalize(&raw)?;
		let serialized = serialize(&signature);
		tracing::info!("Signature received");

		Ok(SignedMessage {
			scheme,
			signature,
			serialized,
			digest: digest.digest,
		})
	}
}

/// Publishes the outcome of an attempt when dropped, or `Idle` if the
/// attempt was abandoned before it produced one.
struct AttemptGuard<'a> {
	state: &'a watch::Sender<SigningState>,
	outcome: Option<SigningState>,
}

impl Drop for AttemptGuard<'_> {
	fn drop(&mut self) {
		let next = match self.outcome.take() {
			Some(outcome) => outcome,
			None => {
				tracing::warn!("Signing attempt abandoned before the signer answered");
				SigningState::Idle
			},
		};
		self.state.send_replace(next);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{verify, VerificationContext};
	use alloy_primitives::{address, Address, B256};
	use async_trait::async_trait;
	use sigkit_digest::authorization_digest;
	use sigkit_signer::{
		implementations::local::LocalSigner, ExternalSigner, MockExternalSigner, SignerError,
	};
	use sigkit_types::{
		AuthorizationRequest, FieldValue, SecretString, StructuredDomain, StructuredMessage,
		StructuredTypes, TypedData, TypedField,
	};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use tokio::sync::Notify;

	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const TEST_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
	const TIMEOUT: Duration = Duration::from_secs(30);

	fn local_signer() -> LocalSigner {
		LocalSigner::new(&SecretString::from(TEST_KEY), 97).unwrap()
	}

	fn orchestrator<S: ExternalSigner + 'static>(
		signer: S,
		capabilities: SignerCapabilities,
	) -> SigningOrchestrator {
		SigningOrchestrator::new(Arc::new(SignerService::new(Box::new(signer))), capabilities)
	}

	fn wallet_test_message(content: &str) -> TypedData {
		let mut types = StructuredTypes::new();
		types.insert(
			"Message".to_string(),
			vec![
				TypedField::new("content", "string"),
				TypedField::new("timestamp", "uint256"),
			],
		);
		let mut message = StructuredMessage::new();
		message.insert("content".to_string(), FieldValue::from(content));
		message.insert("timestamp".to_string(), FieldValue::Integer(1_700_000_000));
		TypedData::new(
			StructuredDomain::new("Wallet Signature Test", "1", 1, Address::ZERO),
			types,
			message,
		)
	}

	fn authorization() -> AuthorizationRequest {
		AuthorizationRequest::new(97, TEST_ADDRESS, 0)
	}

	/// Signer that blocks until released and counts its invocations.
	struct PendingSigner {
		calls: Arc<AtomicUsize>,
		release: Arc<Notify>,
		response: Vec<u8>,
	}

	impl PendingSigner {
		async fn answer(&self) -> Result<Vec<u8>, SignerError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.release.notified().await;
			Ok(self.response.clone())
		}
	}

	#[async_trait]
	impl ExternalSigner for PendingSigner {
		async fn request_accounts(&self) -> Result<Vec<Address>, SignerError> {
			Ok(vec![TEST_ADDRESS])
		}

		async fn chain_id(&self) -> Result<u64, SignerError> {
			Ok(97)
		}

		async fn sign_structured_data(&self, _data: &TypedData) -> Result<Vec<u8>, SignerError> {
			self.answer().await
		}

		async fn sign_digest(&self, _digest: &B256) -> Result<Vec<u8>, SignerError> {
			self.answer().await
		}
	}

	async fn pending_signer() -> (PendingSigner, Arc<AtomicUsize>, Arc<Notify>) {
		let calls = Arc::new(AtomicUsize::new(0));
		let release = Arc::new(Notify::new());
		let response = local_signer()
			.sign_digest(&authorization_digest(&authorization()))
			.await
			.unwrap();
		let signer = PendingSigner {
			calls: calls.clone(),
			release: release.clone(),
			response,
		};
		(signer, calls, release)
	}

	#[tokio::test]
	async fn test_structured_round_trip_with_local_signer() {
		let orchestrator = orchestrator(local_signer(), SignerCapabilities::default());
		let data = wallet_test_message("hello");

		let signed = orchestrator
			.sign(&SigningRequest::StructuredData(data.clone()), TIMEOUT)
			.await
			.unwrap();

		assert_eq!(signed.scheme, SignatureScheme::StructuredData);
		assert_eq!(signed.serialized.len(), 132);
		assert_eq!(
			orchestrator.state(),
			SigningState::Signed {
				scheme: SignatureScheme::StructuredData
			}
		);

		let result = verify(&VerificationContext::StructuredData(data), &signed.serialized)
			.expect_signer(TEST_ADDRESS);
		assert!(result.valid);
		assert_eq!(result.digest, Some(signed.digest));
	}

	#[tokio::test]
	async fn test_authorization_round_trip_with_local_signer() {
		let orchestrator = orchestrator(local_signer(), SignerCapabilities::default());
		let request = SigningRequest::AuthorizationDelegation(authorization());

		let signed = orchestrator.sign(&request, TIMEOUT).await.unwrap();
		assert_eq!(signed.digest, authorization_digest(&authorization()));

		let result = verify(&request, &signed.serialized).expect_signer(TEST_ADDRESS);
		assert!(result.valid);
	}

	#[tokio::test]
	async fn test_structured_request_goes_to_structured_signer() {
		let data = wallet_test_message("hello");
		let response = local_signer().sign_structured_data(&data).await.unwrap();

		let mut mock = MockExternalSigner::new();
		mock.expect_sign_structured_data()
			.withf(|data| data.primary_type.as_deref() == Some("Message"))
			.times(1)
			.returning(move |_| Ok(response.clone()));
		mock.expect_sign_digest().never();

		let orchestrator = orchestrator(mock, SignerCapabilities::default());
		assert!(orchestrator
			.sign(&SigningRequest::StructuredData(data), TIMEOUT)
			.await
			.is_ok());
	}

	#[tokio::test]
	async fn test_second_request_while_awaiting_is_busy() {
		let (signer, calls, release) = pending_signer().await;
		let orchestrator = Arc::new(orchestrator(signer, SignerCapabilities::default()));
		let mut states = orchestrator.subscribe();

		let first = tokio::spawn({
			let orchestrator = orchestrator.clone();
			async move {
				let request = SigningRequest::AuthorizationDelegation(authorization());
				orchestrator.sign(&request, TIMEOUT).await
			}
		});

		states.wait_for(SigningState::is_awaiting).await.unwrap();

		let second = orchestrator
			.sign(&SigningRequest::AuthorizationDelegation(authorization()), TIMEOUT)
			.await;
		assert_eq!(second, Err(SigningError::Busy));
		assert!(orchestrator.state().is_awaiting());

		release.notify_one();
		let signed = first.await.unwrap().unwrap();

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(signed.scheme, SignatureScheme::AuthorizationDelegation);
		assert!(orchestrator.state().is_terminal());
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_ends_attempt_and_frees_gate() {
		let (signer, calls, release) = pending_signer().await;
		let orchestrator = orchestrator(signer, SignerCapabilities::default());
		let request = SigningRequest::AuthorizationDelegation(authorization());

		let result = orchestrator.sign(&request, Duration::from_secs(5)).await;
		assert_eq!(result, Err(SigningError::TimedOut(Duration::from_secs(5))));
		assert_eq!(orchestrator.state(), SigningState::TimedOut);

		release.notify_one();
		assert!(orchestrator.sign(&request, TIMEOUT).await.is_ok());
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn test_rejection() {
		let mut mock = MockExternalSigner::new();
		mock.expect_sign_structured_data()
			.times(1)
			.returning(|_| Err(SignerError::Rejected("User denied message signature".into())));

		let orchestrator = orchestrator(mock, SignerCapabilities::default());
		let result = orchestrator
			.sign(
				&SigningRequest::StructuredData(wallet_test_message("hello")),
				TIMEOUT,
			)
			.await;

		assert!(matches!(result, Err(SigningError::Rejected(_))));
		assert!(matches!(orchestrator.state(), SigningState::Rejected { .. }));
	}

	#[tokio::test]
	async fn test_unsupported_scheme_skips_signer() {
		let mut mock = MockExternalSigner::new();
		mock.expect_sign_digest().never();

		let orchestrator = orchestrator(
			mock,
			SignerCapabilities {
				supports_authorization_delegation: false,
			},
		);
		let result = orchestrator
			.sign(&SigningRequest::AuthorizationDelegation(authorization()), TIMEOUT)
			.await;

		assert_eq!(
			result,
			Err(SigningError::Unsupported(SignatureScheme::AuthorizationDelegation))
		);
		assert!(matches!(orchestrator.state(), SigningState::Failed { .. }));
	}

	#[tokio::test]
	async fn test_schema_mismatch_skips_signer() {
		let mut mock = MockExternalSigner::new();
		mock.expect_sign_structured_data().never();

		let mut data = wallet_test_message("hello");
		data.message.remove("content");

		let orchestrator = orchestrator(mock, SignerCapabilities::default());
		let result = orchestrator
			.sign(&SigningRequest::StructuredData(data), TIMEOUT)
			.await;
		assert!(matches!(result, Err(SigningError::SchemaMismatch(_))));
	}

	#[tokio::test]
	async fn test_malformed_signer_output() {
		let mut mock = MockExternalSigner::new();
		mock.expect_sign_digest()
			.times(1)
			.returning(|_| Ok(vec![0xab; 10]));

		let orchestrator = orchestrator(mock, SignerCapabilities::default());
		let result = orchestrator
			.sign(&SigningRequest::AuthorizationDelegation(authorization()), TIMEOUT)
			.await;

		assert!(matches!(result, Err(SigningError::MalformedSignature(_))));
		assert_eq!(
			orchestrator.state(),
			SigningState::Signed {
				scheme: SignatureScheme::AuthorizationDelegation
			}
		);
	}

	#[tokio::test]
	async fn test_abandoned_attempt_returns_to_idle() {
		let (signer, calls, release) = pending_signer().await;
		let orchestrator = Arc::new(orchestrator(signer, SignerCapabilities::default()));
		let mut states = orchestrator.subscribe();

		let attempt = tokio::spawn({
			let orchestrator = orchestrator.clone();
			async move {
				let request = SigningRequest::AuthorizationDelegation(authorization());
				orchestrator.sign(&request, TIMEOUT).await
			}
		});

		states.wait_for(SigningState::is_awaiting).await.unwrap();
		attempt.abort();
		assert!(attempt.await.unwrap_err().is_cancelled());

		assert_eq!(orchestrator.state(), SigningState::Idle);

		release.notify_one();
		let request = SigningRequest::AuthorizationDelegation(authorization());
		assert!(orchestrator.sign(&request, TIMEOUT).await.is_ok());
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn test_compact_signer_output_is_normalized() {
		let digest = authorization_digest(&authorization());
		let full = local_signer().sign_digest(&digest).await.unwrap();
		let compact = normalize(&full).unwrap().to_compact().to_vec();

		let mut mock = MockExternalSigner::new();
		mock.expect_sign_digest()
			.returning(move |_| Ok(compact.clone()));

		let orchestrator = orchestrator(mock, SignerCapabilities::default());
		let signed = orchestrator
			.sign(&SigningRequest::AuthorizationDelegation(authorization()), TIMEOUT)
			.await
			.unwrap();

		assert_eq!(signed.signature, normalize(&full).unwrap());
		assert_eq!(signed.details().v, signed.signature.v());
	}
}
