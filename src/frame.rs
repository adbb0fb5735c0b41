//! Frame parser (C4): turns one sampled bit window into a [`Frame`], or the
//! [`FrameError`] that stopped it.

use crate::error::FrameError;
use crate::sampler::SampleWindow;

/// The CRC-15 polynomial used by the CAN protocol (x^15 + x^14 + x^10 + x^8
/// + x^7 + x^4 + x^3 + 1), in the truncated form this decoder's running CRC
/// register is masked to.
pub const CRC15_POLY: u16 = 0x4599;
/// Mask applied to the running CRC register after every update; CRC-15 is a
/// 15-bit value.
pub const CRC15_MASK: u16 = 0x7fff;

/// A single decoded CAN frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Start time of the frame (the bit-time-unit center of its SOF bit,
    /// minus half a bit).
    pub t1: f32,
    /// End time of the frame (the center of its last IFS bit, plus half a
    /// bit).
    pub t2: f32,
    /// Extended (29-bit) identifier format.
    pub ide: bool,
    /// Remote transmission request.
    pub rtr: bool,
    /// Arbitration identifier: 11 bits for a standard frame, or the
    /// 11+18-bit extended identifier for an extended frame.
    pub id: u32,
    /// Data length code, as transmitted (0-15; only 0-8 carry data bytes).
    pub dlc: u8,
    /// Data bytes. Only the first `min(dlc, 8)` entries are meaningful.
    pub data: [u8; 8],
}

/// An annotation: a labeled time span within a frame, suitable for display
/// alongside the raw samples.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Annotation {
    /// Start time of the annotated span.
    pub t1: f32,
    /// End time of the annotated span.
    pub t2: f32,
    /// Short label, truncated to 12 characters.
    pub label: String,
}

impl Annotation {
    const MAX_LABEL_LEN: usize = 12;

    fn new(t1: f32, t2: f32, label: String) -> Self {
        if label.chars().count() > Self::MAX_LABEL_LEN {
            log::warn!(
                "annotation label {:?} exceeds {} characters, truncating",
                label,
                Self::MAX_LABEL_LEN
            );
            let label = label.chars().take(Self::MAX_LABEL_LEN).collect();
            Annotation { t1, t2, label }
        } else {
            Annotation { t1, t2, label }
        }
    }
}

/// Per-frame parsing state: a cursor into a [`SampleWindow`] plus the
/// running bit-stuffing and CRC state, and the raw-sample/annotation trail
/// accumulated along the way.
///
/// One `FrameCursor` is used for exactly one candidate frame. `k` only ever
/// grows; `parse_frame` stops advancing it as soon as it returns, whether
/// by success or by [`FrameError`].
pub(crate) struct FrameCursor<'w> {
    window: &'w SampleWindow,
    k: usize,
    last_level: Option<bool>,
    num_repeats: u32,
    crc: u16,
    pub raw_samples: Vec<(f32, u8)>,
    pub annotations: Vec<Annotation>,
}

impl<'w> FrameCursor<'w> {
    pub(crate) fn new(window: &'w SampleWindow) -> Self {
        FrameCursor {
            window,
            k: 0,
            last_level: None,
            num_repeats: 0,
            crc: 0,
            raw_samples: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// How many sample slots this cursor has consumed so far. Used by the
    /// run loop to advance past the frame (or the part of it that parsed)
    /// once `parse_frame` returns.
    pub(crate) fn bits_consumed(&self) -> usize {
        self.k
    }

    /// The sample time of the last bit consumed, or the window's first
    /// sample time if none have been consumed yet. Used by the run loop to
    /// place the "!" error annotation.
    pub(crate) fn last_sample_t(&self) -> f32 {
        let idx = self.k.saturating_sub(1);
        self.window.sample_t[idx] as f32
    }

    /// Reads the next sampled bit, optionally removing a stuff bit and
    /// updating the running CRC.
    ///
    /// `unstuff` should be true for every bit up through the CRC field, and
    /// false for the CRC delimiter, ACK, ACK delimiter and EOF/IFS bits that
    /// follow, since those are not subject to bit-stuffing. `update_crc`
    /// should be true for every bit up to (but not including) the CRC
    /// field itself.
    fn next_bit(&mut self, unstuff: bool, update_crc: bool) -> Result<bool, FrameError> {
        assert!(
            self.k < self.window.sample_level.len(),
            "all sample bits already consumed"
        );
        let x = self.window.sample_level[self.k];
        self.raw_samples.push((self.window.sample_t[self.k] as f32, x as u8));
        self.k += 1;

        if unstuff && Some(x) == self.last_level {
            self.num_repeats += 1;
            if self.num_repeats == 5 {
                assert!(
                    self.k < self.window.sample_level.len(),
                    "all sample bits already consumed"
                );
                let xstuffed = self.window.sample_level[self.k];
                if Some(xstuffed) == self.last_level {
                    self.raw_samples
                        .push((self.window.sample_t[self.k] as f32, xstuffed as u8 | 4));
                    return Err(FrameError::Stuff);
                } else {
                    self.raw_samples
                        .push((self.window.sample_t[self.k] as f32, xstuffed as u8 | 2));
                    self.k += 1;
                    self.last_level = Some(xstuffed);
                    self.num_repeats = 1;
                }
            }
        } else {
            self.last_level = Some(x);
            self.num_repeats = 1;
        }

        if update_crc {
            self.crc <<= 1;
            let msb = (self.crc >> 15) & 1 != 0;
            if msb ^ x {
                self.crc ^= CRC15_POLY;
            }
            self.crc &= CRC15_MASK;
        }
        Ok(x)
    }

    /// Reads `nbits` bits MSB-first into a `u32`, optionally recording a
    /// time-spanning annotation built from the field's final value by
    /// `label`.
    fn next_field<F>(
        &mut self,
        nbits: u32,
        label: Option<F>,
        unstuff: bool,
        update_crc: bool,
    ) -> Result<u32, FrameError>
    where
        F: FnOnce(u32) -> String,
    {
        let start_k = self.k;
        let mut value = 0u32;
        for _ in 0..nbits {
            let bit = self.next_bit(unstuff, update_crc)?;
            value = (value << 1) | bit as u32;
        }
        if let Some(label) = label {
            let t1 = self.window.sample_t[start_k] as f32 - 0.5;
            let t2 = self.window.sample_t[self.k] as f32 - 0.5;
            self.annotations.push(Annotation::new(t1, t2, label(value)));
        }
        Ok(value)
    }

    /// Parses one complete frame, from the SOF bit through the IFS field.
    ///
    /// On success, `self.k` is positioned just past the IFS field. On
    /// failure, `self.k` is positioned just past whatever bit made the
    /// decision to fail -- the run loop uses this to resynchronize.
    pub(crate) fn parse_frame(&mut self) -> Result<Frame, FrameError> {
        if self.next_bit(true, true)? {
            return Err(FrameError::Sof);
        }

        let mut id = self.next_field(11, Some(|v| format!("IDA={:03X}", v)), true, true)?;
        let mut rtr = self.next_bit(true, true)?;
        let ide = self.next_bit(true, true)?;

        if ide {
            if !rtr {
                return Err(FrameError::Ssr);
            }
            let id_b = self.next_field(18, Some(|v| format!("IDB={:05X}", v)), true, true)?;
            id = (id << 18) | id_b;
            rtr = self.next_bit(true, true)?;
            let _r1 = self.next_bit(true, true)?;
        }
        let _r0 = self.next_bit(true, true)?;

        let dlc = self.next_field(4, Some(|v| format!("DLC={}", v)), true, true)? as u8;

        let mut data = [0u8; 8];
        if !rtr {
            for i in 0..dlc as usize {
                let byte = self.next_field(
                    8,
                    Some(move |v| format!("DATA{}={:02X}", i, v)),
                    true,
                    true,
                )? as u8;
                if i < data.len() {
                    data[i] = byte;
                }
            }
        }

        let crc_field = self.next_field(15, Some(|v| format!("CRC={:04X}", v)), true, false)? as u16;
        if crc_field != self.crc {
            return Err(FrameError::Crc {
                got: crc_field,
                expected: self.crc,
            });
        }

        if !self.next_bit(false, false)? {
            return Err(FrameError::CrcDelim);
        }
        if self.next_bit(false, false)? {
            return Err(FrameError::Ack);
        }
        if !self.next_bit(false, false)? {
            return Err(FrameError::AckDelim);
        }

        let eof = self.next_field(7, Some(|_| "EOF".to_string()), false, false)?;
        if eof != 0x7f {
            return Err(FrameError::Eof);
        }
        let ifs = self.next_field(3, Some(|_| "IFS".to_string()), false, false)?;
        if ifs != 0x7 {
            return Err(FrameError::Ifs);
        }

        let t1 = self.window.sample_t[0] as f32 - 0.5;
        let t2 = self.window.sample_t[self.k - 1] as f32 + 0.5;
        Ok(Frame {
            t1,
            t2,
            ide,
            rtr,
            id,
            dlc,
            data,
        })
    }
}
