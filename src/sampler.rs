//! Bit sampler (C3): projects the next `nbits` bit slots from the current
//! cursor position, for the frame parser to read through.

use bitvec::prelude::{BitVec, Lsb0};

use crate::error::EndOfStream;
use crate::stream::TransitionStream;

/// A materialized sampling window: per-slot center times, cumulative
/// transition counts, and sampled levels, all relative to the cursor
/// position the window was built at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SampleWindow {
    /// Cursor position this window was sampled from (after the sampler's
    /// own glitch-skip advance, before any bits are consumed from it).
    pub cursor: usize,
    /// Bit-slot center times, in bit-time units.
    pub sample_t: Vec<f64>,
    /// For each slot, the count of transitions at or before that slot's
    /// center time, counted from `cursor`.
    pub sample_idx: Vec<usize>,
    /// Per-slot sampled level.
    pub sample_level: BitVec<u8, Lsb0>,
}

/// Sampling configuration: window length and glitch suppression width.
pub(crate) struct Sampler {
    pub nbits: usize,
    pub max_glitch: f64,
}

impl Sampler {
    /// Prepares a sampling window starting at `cursor`. Returns
    /// [`EndOfStream`] if `cursor` is, or becomes, at or past the end of
    /// the transition stream while finding a candidate SOF edge.
    pub fn sample(
        &self,
        stream: &TransitionStream,
        cursor: usize,
    ) -> Result<SampleWindow, EndOfStream> {
        let dt = stream.dt();
        let m = dt.len();
        let checked = |c: usize| if c >= m { Err(EndOfStream) } else { Ok(c) };

        let mut cursor = checked(cursor)?;
        if !stream.level_at_cursor(cursor) {
            // Advance to the next bus-idle-to-active edge.
            cursor = checked(cursor + 1)?;
        }
        // Skip over paired glitches on the bus-idle side.
        while cursor < m.saturating_sub(2) && dt[cursor + 1] - dt[cursor] < self.max_glitch {
            cursor += 2;
        }

        let sample_t: Vec<f64> = (0..self.nbits)
            .map(|i| dt[cursor] + 0.5 + i as f64)
            .collect();
        let last = searchsorted_left(dt, *sample_t.last().expect("nbits > 0"));
        let hi = (cursor + last + 1).min(m);
        let slice = &dt[cursor..hi];
        let sample_idx: Vec<usize> = sample_t
            .iter()
            .map(|&t| searchsorted_left(slice, t))
            .collect();
        let sample_level: BitVec<u8, Lsb0> = sample_idx
            .iter()
            .map(|&idx| stream.level_at_cursor(cursor + idx))
            .collect();

        Ok(SampleWindow {
            cursor,
            sample_t,
            sample_idx,
            sample_level,
        })
    }
}

/// Equivalent to numpy's `searchsorted(sorted, value, side='left')`: the
/// number of elements in `sorted` strictly less than `value`.
fn searchsorted_left(sorted: &[f64], value: f64) -> usize {
    sorted.partition_point(|&x| x < value)
}
