//! Delay strategies applied between fetch attempts.

use std::time::Duration;

/// Upper bound used by [`Backoff::doubling`].
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Pause inserted after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same pause after every failure.
    Fixed { delay: Duration },
    /// `base * factor^attempt`, capped at `max`. With `jitter`, the pause is
    /// drawn uniformly from the upper half of that value.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::fixed_ms(1_000)
    }
}

impl Backoff {
    pub const fn fixed_ms(delay_ms: u64) -> Self {
        Self::Fixed {
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Doubling pauses starting at `base`, jittered, capped at [`DEFAULT_MAX_DELAY`].
    pub const fn doubling(base: Duration) -> Self {
        Self::Exponential {
            base,
            factor: 2.0,
            max: DEFAULT_MAX_DELAY,
            jitter: true,
        }
    }

    /// Pause after the failed attempt numbered `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                // overflow and non-finite growth saturate at the cap
                let capped = Duration::try_from_secs_f64(base.as_secs_f64() * factor.powi(exponent))
                    .map_or(max, |grown| grown.min(max));

                if jitter {
                    spread_upper_half(capped)
                } else {
                    capped
                }
            }
        }
    }
}

fn spread_upper_half(delay: Duration) -> Duration {
    let floor = delay / 2;
    let span_ms = u64::try_from((delay - floor).as_millis()).unwrap_or(u64::MAX);
    floor + Duration::from_millis(fastrand::u64(0..=span_ms))
}
