//! Cooperative cancellation for update requests
//!
//! The retry controller polls for cancellation before every store read and
//! before every conditional write, and keeps watching while it backs off
//! between attempts. Once triggered it abandons the request without issuing
//! a partial write.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Shared cancellation flag
///
/// Clones share the same flag, so one clone can be handed to the request and
/// another kept by whoever may withdraw it. `cancel` and `is_cancelled` are
/// plain synchronous calls; no async runtime is involved.
///
/// # Example
///
/// ```
/// use occstore_concurrency::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
pub type CancellationToken = tokio_util::sync::CancellationToken;

/// Granularity of [`sleep`] between cancellation checks
const SLICE: Duration = Duration::from_millis(2);

/// Why a request was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The caller triggered its cancellation token
    Signal,
    /// The request deadline passed
    Deadline,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Signal => write!(f, "cancelled by caller"),
            CancelReason::Deadline => write!(f, "deadline exceeded"),
        }
    }
}

/// Check a token and deadline together
pub(crate) fn poll(token: Option<&CancellationToken>, deadline: Option<Instant>) -> Option<CancelReason> {
    if token.is_some_and(CancellationToken::is_cancelled) {
        return Some(CancelReason::Signal);
    }
    match deadline {
        Some(at) if Instant::now() >= at => Some(CancelReason::Deadline),
        _ => None,
    }
}

/// Sleep up to `wait`, waking early once the token or deadline fires
///
/// Returns the reason if the sleep was cut short.
pub(crate) fn sleep(
    wait: Duration,
    token: Option<&CancellationToken>,
    deadline: Option<Instant>,
) -> Option<CancelReason> {
    let until = Instant::now() + wait;
    loop {
        if let Some(reason) = poll(token, deadline) {
            return Some(reason);
        }
        let now = Instant::now();
        if now >= until {
            return None;
        }
        let mut step = (until - now).min(SLICE);
        if let Some(at) = deadline {
            step = step.min(at.saturating_duration_since(now));
        }
        std::thread::sleep(step);
    }
}
