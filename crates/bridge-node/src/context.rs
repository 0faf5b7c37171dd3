//! Deadline and cancellation carried through one translation.

use crate::NodeError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Per-request deadline and cancellation signal.
///
/// Cloning is cheap; clones observe the same cancellation signal. Every node
/// call made through [`NodeService`](crate::NodeService) is raced against
/// both, and whichever fires first turns the call into
/// [`NodeError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
	deadline: Option<Instant>,
	cancel: Option<watch::Receiver<bool>>,
}

/// Triggers cancellation for every clone of the paired context.
#[derive(Debug)]
pub struct CancelHandle {
	sender: watch::Sender<bool>,
}

impl CancelHandle {
	pub fn cancel(&self) {
		self.sender.send_replace(true);
	}
}

impl RequestContext {
	/// A context with no deadline that is never cancelled.
	pub fn background() -> Self {
		Self::default()
	}

	/// Sets the deadline to `timeout` from now, keeping an earlier one.
	pub fn with_timeout(self, timeout: Duration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(match self.deadline {
			Some(existing) => existing.min(deadline),
			None => deadline,
		});
		self
	}

	/// Attaches a fresh cancellation signal, replacing any previous one.
	pub fn cancellable(mut self) -> (Self, CancelHandle) {
		let (sender, receiver) = watch::channel(false);
		self.cancel = Some(receiver);
		(self, CancelHandle { sender })
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
	}

	fn is_expired(&self) -> bool {
		self.deadline.is_some_and(|d| Instant::now() >= d)
	}

	/// Runs `fut` unless the context is cancelled or its deadline passes
	/// first. `operation` names the call in the resulting error.
	pub async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T, NodeError>
	where
		F: Future<Output = Result<T, NodeError>>,
	{
		if self.is_cancelled() {
			return Err(NodeError::Cancelled(format!(
				"{} cancelled before start",
				operation
			)));
		}
		if self.is_expired() {
			return Err(NodeError::Cancelled(format!(
				"{} not started, request deadline passed",
				operation
			)));
		}

		let cancelled = async {
			match self.cancel.clone() {
				Some(mut rx) => loop {
					if *rx.borrow_and_update() {
						break;
					}
					if rx.changed().await.is_err() {
						// Handle dropped without cancelling.
						std::future::pending::<()>().await;
					}
				},
				None => std::future::pending::<()>().await,
			}
		};
		let expired = async {
			match self.deadline {
				Some(deadline) => tokio::time::sleep_until(deadline).await,
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			biased;
			_ = cancelled => Err(NodeError::Cancelled(format!("{} cancelled", operation))),
			_ = expired => Err(NodeError::Cancelled(format!(
				"{} exceeded request deadline",
				operation
			))),
			result = fut => result,
		}
	}
}
