//! Shared helper for building synthetic CAN transition streams: the
//! inverse of this crate's own frame parser, used to generate fixtures
//! the parser should accept (or specifically reject).

pub const CRC15_POLY: u16 = 0x4599;
pub const CRC15_MASK: u16 = 0x7fff;

/// Appends the `n` low bits of `value`, MSB-first.
pub fn push_bits(out: &mut Vec<bool>, value: u32, n: u32) {
    for i in (0..n).rev() {
        out.push((value >> i) & 1 != 0);
    }
}

/// CRC-15 over a sequence of logical (unstuffed) bits, using the same
/// shift-then-test update rule the decoder's running CRC uses.
pub fn crc15(bits: &[bool]) -> u16 {
    let mut crc: u16 = 0;
    for &x in bits {
        crc <<= 1;
        let msb = (crc >> 15) & 1 != 0;
        if msb ^ x {
            crc ^= CRC15_POLY;
        }
        crc &= CRC15_MASK;
    }
    crc
}

/// Inserts a complementary bit after every run of 5 consecutive identical
/// bits, the transmitter-side counterpart to the decoder's unstuffing.
pub fn stuff(bits: &[bool]) -> Vec<bool> {
    let mut out = Vec::new();
    let mut last: Option<bool> = None;
    let mut run = 0u32;
    for &b in bits {
        out.push(b);
        if Some(b) == last {
            run += 1;
        } else {
            last = Some(b);
            run = 1;
        }
        if run == 5 {
            let stuffed = !b;
            out.push(stuffed);
            last = Some(stuffed);
            run = 1;
        }
    }
    out
}

/// Converts a full bit-level sequence (idle level `x0` followed by
/// `bits`) into the transition-time array a [`can_decode::TransitionStream`]
/// expects: one entry per bit-slot boundary where the level changes,
/// timestamped by its slot index.
pub fn bits_to_dt(x0: bool, bits: &[bool]) -> Vec<f64> {
    let mut dt = Vec::new();
    let mut prev = x0;
    for (i, &b) in bits.iter().enumerate() {
        if b != prev {
            dt.push(i as f64);
        }
        prev = b;
    }
    dt
}

/// Built-up raw (pre-stuffing) bit sequence for one frame, from SOF
/// through the CRC field, plus its already-computed CRC.
pub struct RawFrame {
    pub bits: Vec<bool>,
    pub crc: u16,
}

/// Encodes the stuffable SOF..CRC portion of a frame, without the fixed,
/// unstuffed tail (CRC delimiter through IFS).
pub fn encode_raw(ide: bool, rtr: bool, id: u32, dlc: u8, data: &[u8]) -> RawFrame {
    let mut raw = Vec::new();
    raw.push(false); // SOF: dominant

    if ide {
        push_bits(&mut raw, (id >> 18) & 0x7ff, 11); // IDA
        raw.push(true); // SRR: recessive
        raw.push(true); // IDE: recessive (extended)
        push_bits(&mut raw, id & 0x3ffff, 18); // IDB
        raw.push(rtr); // RTR
        raw.push(false); // r1
    } else {
        push_bits(&mut raw, id & 0x7ff, 11); // IDA
        raw.push(rtr); // RTR
        raw.push(false); // IDE: dominant (standard)
    }
    raw.push(false); // r0

    push_bits(&mut raw, dlc as u32, 4);
    if !rtr {
        for &byte in data {
            push_bits(&mut raw, byte as u32, 8);
        }
    }

    let crc = crc15(&raw);
    RawFrame { bits: raw, crc }
}

/// Encodes a complete, well-formed frame (correct CRC, ACK present) as its
/// full per-bit-time level sequence (SOF through IFS, stuffing and tail
/// included) -- the idle level in effect before bit 0 is always recessive
/// (`true`). Stitching several frames back-to-back (no gap beyond the
/// mandatory IFS) is just concatenating these: unlike gluing two
/// [`encode_frame`] transition arrays together with a guessed time offset,
/// there is no risk of the next frame's SOF landing inside the previous
/// frame's own unstuffed trailer.
pub fn encode_frame_bits(ide: bool, rtr: bool, id: u32, dlc: u8, data: &[u8]) -> Vec<bool> {
    let raw = encode_raw(ide, rtr, id, dlc, data);
    let mut with_crc = raw.bits.clone();
    push_bits(&mut with_crc, raw.crc as u32, 15);

    let mut bits = stuff(&with_crc);
    append_tail(&mut bits, true);
    bits
}

/// Encodes a complete, well-formed frame (correct CRC, ACK present) into a
/// `(x0, dt)` pair ready for [`can_decode::TransitionStream::new`].
pub fn encode_frame(ide: bool, rtr: bool, id: u32, dlc: u8, data: &[u8]) -> (bool, Vec<f64>) {
    let bits = encode_frame_bits(ide, rtr, id, dlc, data);
    (true, bits_to_dt(true, &bits))
}

/// Appends the fixed, unstuffed tail: CRC delimiter, ACK, ACK delimiter,
/// EOF and IFS. `ack` selects whether a receiver is simulated as pulling
/// the ACK slot dominant.
pub fn append_tail(bits: &mut Vec<bool>, ack: bool) {
    bits.push(true); // CRC delimiter: recessive
    bits.push(!ack); // ACK: dominant if acknowledged
    bits.push(true); // ACK delimiter: recessive
    for _ in 0..7 {
        bits.push(true); // EOF
    }
    for _ in 0..3 {
        bits.push(true); // IFS
    }
}
