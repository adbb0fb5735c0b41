//! Error types returned by this crate.

/// The set of CAN protocol violations that abort a single frame decode.
///
/// Each variant corresponds 1:1 to a bucket in the run's error table
/// (`Decoder::errors`); the associated [`ErrorKind`] is how callers key
/// into that table without needing to destructure the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// First bit of a candidate frame is recessive (1).
    Sof,
    /// IDE=1 but the tentative RTR bit was 0.
    Ssr,
    /// Computed CRC does not match the transmitted CRC field.
    Crc,
    /// CRC delimiter bit is dominant.
    CrcDelim,
    /// ACK slot is recessive: no receiver acknowledged.
    Ack,
    /// ACK delimiter bit is dominant.
    AckDelim,
    /// EOF field is not seven recessive bits.
    Eof,
    /// IFS field is not three recessive bits.
    Ifs,
    /// Six consecutive identical raw bits observed (error frame condition).
    Stuff,
}

impl ErrorKind {
    /// A short, stable identifier for this kind, suitable for display or
    /// use as a map key in contexts that want a string rather than the
    /// enum itself.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Sof => "SOF",
            ErrorKind::Ssr => "SSR",
            ErrorKind::Crc => "CRC",
            ErrorKind::CrcDelim => "CRCdelim",
            ErrorKind::Ack => "ACK",
            ErrorKind::AckDelim => "ACKdelim",
            ErrorKind::Eof => "EOF",
            ErrorKind::Ifs => "IFS",
            ErrorKind::Stuff => "Stuff",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single protocol violation encountered while decoding one frame.
///
/// Carries enough detail for a human-readable message; bucketing into the
/// error table only needs [`FrameError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameError {
    /// Invalid start of frame (SOF) bit.
    #[error("invalid start of frame (SOF) bit")]
    Sof,

    /// Invalid substitute remote request (SSR) bit.
    #[error("invalid substitute remote request (SSR) bit")]
    Ssr,

    /// CRC failed: the computed running CRC does not match the
    /// transmitted CRC field.
    #[error("CRC failed: got {got:#06x} but expected {expected:#06x}")]
    Crc {
        /// The CRC value transmitted in the frame.
        got: u16,
        /// The CRC value this decoder computed over SOF..DATA.
        expected: u16,
    },

    /// Invalid CRC delimiter bit.
    #[error("invalid CRC delimiter bit")]
    CrcDelim,

    /// Missing ACK from any receiver.
    #[error("missing ACK from any receiver")]
    Ack,

    /// Invalid ACK delimiter bit.
    #[error("invalid ACK delimiter bit")]
    AckDelim,

    /// Invalid end of frame (EOF).
    #[error("invalid end of frame (EOF)")]
    Eof,

    /// Invalid interframe space (IFS).
    #[error("invalid interframe space (IFS)")]
    Ifs,

    /// Error frame detected: a sixth consecutive identical raw bit was
    /// observed where a complementary stuff bit was expected.
    #[error("error frame detected (invalid stuff bit)")]
    Stuff,
}

impl FrameError {
    /// The [`ErrorKind`] bucket this error belongs to.
    pub fn kind(self) -> ErrorKind {
        match self {
            FrameError::Sof => ErrorKind::Sof,
            FrameError::Ssr => ErrorKind::Ssr,
            FrameError::Crc { .. } => ErrorKind::Crc,
            FrameError::CrcDelim => ErrorKind::CrcDelim,
            FrameError::Ack => ErrorKind::Ack,
            FrameError::AckDelim => ErrorKind::AckDelim,
            FrameError::Eof => ErrorKind::Eof,
            FrameError::Ifs => ErrorKind::Ifs,
            FrameError::Stuff => ErrorKind::Stuff,
        }
    }
}

/// Errors that can occur constructing a [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CanError {
    /// The `times` array was not strictly increasing, so it cannot be a
    /// valid transition stream (§3: `dt` is a strictly increasing
    /// sequence).
    #[error("transition times are not strictly increasing (first violation at index {0})")]
    NotMonotonic(usize),
}

/// Marker for "the cursor ran past the end of the transition stream".
///
/// Not a [`FrameError`]: running out of capture is normal termination, not
/// a protocol violation, so it is kept out of the public error enum
/// entirely (see design notes on "Error flow as control flow").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EndOfStream;
