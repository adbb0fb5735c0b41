//! Transition stream (C2): the sole input the decoder reads.

use crate::error::CanError;

/// An ordered sequence of logic-level transition times, in bit-time units,
/// plus the initial level.
///
/// Invariant: the logical level between `dt[k]` and `dt[k+1]` equals
/// `(x0 + k + 1) mod 2`; the level before `dt[0]` equals `x0`. `dt` is
/// strictly increasing, enforced at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionStream {
    x0: bool,
    dt: Vec<f64>,
}

impl TransitionStream {
    /// Builds a transition stream directly from bit-time-unit transition
    /// times. Returns [`CanError::NotMonotonic`] if `dt` is not strictly
    /// increasing.
    pub fn new(x0: bool, dt: Vec<f64>) -> Result<Self, CanError> {
        if let Some(i) = dt.windows(2).position(|w| !(w[0] < w[1])) {
            return Err(CanError::NotMonotonic(i + 1));
        }
        Ok(TransitionStream { x0, dt })
    }

    /// Builds a transition stream from wall-clock transition times in
    /// seconds, rescaling to bit-time units via `dt = rate_bps * (t -
    /// t0)`.
    pub fn from_seconds(
        times: &[f64],
        x0: bool,
        t0: f64,
        rate_bps: f64,
    ) -> Result<Self, CanError> {
        let dt = times.iter().map(|&t| rate_bps * (t - t0)).collect();
        Self::new(x0, dt)
    }

    /// The initial logic level, in effect before `self.dt[0]`.
    pub fn x0(&self) -> bool {
        self.x0
    }

    /// The transition times, in bit-time units.
    pub fn dt(&self) -> &[f64] {
        &self.dt
    }

    /// Number of transitions in the stream.
    pub fn len(&self) -> usize {
        self.dt.len()
    }

    /// Whether the stream has no transitions at all.
    pub fn is_empty(&self) -> bool {
        self.dt.is_empty()
    }

    /// The logic level that holds immediately after `cursor` transitions
    /// have been consumed, i.e. `(x0 + cursor) mod 2`.
    pub(crate) fn level_at_cursor(&self, cursor: usize) -> bool {
        (self.x0 as usize + cursor) % 2 == 1
    }
}
