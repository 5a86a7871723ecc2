//! Retransmission policy for SNMP requests.
//!
//! UDP gives no delivery guarantee, so the client resends a request that
//! saw no reply. This is the wire engine's concern only: device-level polling
//! and read-back verification have their own policies in [`crate::row`].

use std::time::Duration;

/// Retransmission configuration.
///
/// ```rust
/// use albedo_snmp::Retry;
/// use std::time::Duration;
///
/// // No retransmission
/// let retry = Retry::none();
///
/// // Fixed delay between retransmissions
/// let retry = Retry::fixed(3, Duration::from_millis(200));
///
/// // 100ms, 200ms, 400ms, capped at 1s
/// let retry = Retry::exponential(3, Duration::from_millis(100), Duration::from_secs(1));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Retry {
    /// Maximum number of retransmissions (0 = request sent once)
    pub max_attempts: u32,
    /// Delay strategy between attempts
    pub backoff: Backoff,
}

/// Delay strategy between retransmissions.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Backoff {
    /// Resend immediately after a timeout.
    #[default]
    None,

    /// Fixed delay before each retransmission.
    Fixed { delay: Duration },

    /// Delay doubles after each attempt, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Default for Retry {
    /// Default: 3 retransmissions with no delay between attempts.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::None,
        }
    }
}

impl Retry {
    /// No retransmission - request is sent once and fails on timeout.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            backoff: Backoff::None,
        }
    }

    /// Fixed delay between retransmissions.
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: attempts,
            backoff: Backoff::Fixed { delay },
        }
    }

    /// Exponential backoff starting at `initial`, capped at `max`.
    pub fn exponential(attempts: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_attempts: attempts,
            backoff: Backoff::Exponential { initial, max },
        }
    }

    /// Compute the delay before the retransmission following `attempt`.
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay } => *delay,
            Backoff::Exponential { initial, max } => {
                let multiplier = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
                initial.saturating_mul(multiplier).min(*max)
            }
        }
    }
}
