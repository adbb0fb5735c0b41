//! Hysteresis digitizer (C1): turns analog samples into a digital level
//! sequence, or into the transition indices a [`TransitionStream`] is built
//! from.
//!
//! This is the analog-to-digital front end the decoder's input contract
//! depends on; everything upstream of it (channel pairing, file-format
//! parsing) lives outside this crate.

/// Options controlling how analog samples are digitized.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DigitizerOptions {
    /// Threshold value half way between the nominal hi and lo digital
    /// values.
    pub threshold: f64,

    /// Amount of hysteresis to use during digitization. Defines a deadband
    /// of this size centered on `threshold`: samples above or below the
    /// threshold are unambiguous, but samples within the deadband retain
    /// their previous unambiguous value.
    pub hysteresis: f64,

    /// Flip both the reported initial level and the polarity of every
    /// transition. A differential CAN_H/CAN_L pair is conventionally fed
    /// in as `CAN_H - CAN_L` with `inverted = true`, since the bus is
    /// dominant (logical 0) when `CAN_H > CAN_L`.
    pub inverted: bool,
}

impl Default for DigitizerOptions {
    fn default() -> Self {
        DigitizerOptions {
            threshold: 0.0,
            hysteresis: 0.0,
            inverted: false,
        }
    }
}

/// Applies hysteresis latching to raw `> threshold` classifications,
/// returning the latched high/low levels.
///
/// A maximal run where a sample is neither unambiguously above nor below
/// the deadband is latched to the last unambiguous level seen before the
/// run started; the very first sample (if itself inside the deadband) is
/// left at its raw `sample >= threshold` classification, since there is no
/// earlier level to latch to.
fn latch(samples: &[f64], threshold: f64, hysteresis: f64) -> Vec<bool> {
    let n = samples.len();
    let half = hysteresis / 2.0;
    let mut hi: Vec<bool> = samples.iter().map(|&s| s > threshold + half).collect();
    let lo: Vec<bool> = samples.iter().map(|&s| s < threshold - half).collect();
    if n == 0 {
        return hi;
    }

    let in_deadband = |hi: &[bool], i: usize| !lo[i] && !hi[i];
    let mut enter = 0usize;
    let mut level = samples[0] >= threshold;
    for k in 1..n {
        let was = in_deadband(&hi, k - 1);
        let now = in_deadband(&hi, k);
        if was == now {
            continue;
        }
        if !now {
            // Leaving the deadband from samples[k-1] to samples[k]: latch
            // the whole run just traversed to the level seen before it.
            for h in hi.iter_mut().take(k).skip(enter) {
                *h = level;
            }
        } else {
            // Entering the deadband from samples[k-1] to samples[k].
            enter = k;
            level = hi[k - 1];
        }
    }
    hi
}

/// Digitizes `samples` into transition indices plus an initial level.
///
/// `indices[j]` is the first sample index *after* the `j`-th level change
/// (so indexing `samples` at `indices[j] - 1` and `indices[j]` straddles
/// the transition). Indices are strictly increasing; no transition is
/// reported inside a deadband-only run.
pub fn digitize_transitions(samples: &[f64], opts: DigitizerOptions) -> (Vec<usize>, bool) {
    if samples.is_empty() {
        return (Vec::new(), opts.inverted);
    }
    let hi = latch(samples, opts.threshold, opts.hysteresis);
    let indices = hi
        .windows(2)
        .enumerate()
        .filter_map(|(i, w)| if w[0] != w[1] { Some(i + 1) } else { None })
        .collect();
    let level0 = hi[0] ^ opts.inverted;
    (indices, level0)
}

/// Digitizes `samples` into a per-sample dense level sequence.
pub fn digitize_dense(samples: &[f64], opts: DigitizerOptions) -> Vec<bool> {
    let hi = latch(samples, opts.threshold, opts.hysteresis);
    hi.into_iter().map(|h| h ^ opts.inverted).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        let (indices, _level0) = digitize_transitions(&[], DigitizerOptions::default());
        assert!(indices.is_empty());
    }

    #[test]
    fn clean_square_wave() {
        let samples = [0.0, 0.0, 5.0, 5.0, 0.0, 0.0, 5.0, 5.0];
        let opts = DigitizerOptions {
            threshold: 2.5,
            hysteresis: 1.0,
            inverted: false,
        };
        let (indices, level0) = digitize_transitions(&samples, opts);
        assert_eq!(indices, vec![2, 4, 6]);
        assert!(!level0);
    }

    #[test]
    fn deadband_run_latches_to_prior_level() {
        // Settles high, dips into the deadband (neither hi nor lo) for a
        // couple of samples, then returns high: no transition should be
        // reported across the dip.
        let samples = [5.0, 5.0, 2.5, 2.5, 5.0, 5.0];
        let opts = DigitizerOptions {
            threshold: 2.5,
            hysteresis: 1.0,
            inverted: false,
        };
        let (indices, level0) = digitize_transitions(&samples, opts);
        assert!(level0);
        assert!(indices.is_empty());
    }

    #[test]
    fn inversion_flips_level0_but_not_indices() {
        let samples = [0.0, 0.0, 5.0, 5.0];
        let opts = DigitizerOptions {
            threshold: 2.5,
            hysteresis: 1.0,
            inverted: false,
        };
        let opts_inv = DigitizerOptions {
            inverted: true,
            ..opts
        };
        let (indices, level0) = digitize_transitions(&samples, opts);
        let (indices_inv, level0_inv) = digitize_transitions(&samples, opts_inv);
        assert_eq!(indices, indices_inv);
        assert_eq!(level0, !level0_inv);
    }

    #[test]
    fn dense_mode_matches_transition_mode() {
        let samples = [0.0, 0.0, 5.0, 5.0, 0.0, 0.0];
        let opts = DigitizerOptions {
            threshold: 2.5,
            hysteresis: 1.0,
            inverted: false,
        };
        let dense = digitize_dense(&samples, opts);
        let (indices, level0) = digitize_transitions(&samples, opts);

        assert_eq!(dense[0], level0);
        for i in 1..samples.len() {
            let changed = dense[i] != dense[i - 1];
            assert_eq!(changed, indices.contains(&i), "mismatch at sample {}", i);
        }
    }
}
