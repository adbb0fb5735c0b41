//! # `can-decode`
//!
//! An offline forensic decoder for the CAN 2.0 A/B bus protocol. Given the
//! digital transition times captured from a CAN bus (already digitized
//! from the differential CAN_H/CAN_L pair -- that pairing and any
//! file-format loading are outside this crate), this decodes every frame
//! it can find, reverses bit-stuffing, validates CRC-15 and the fixed-form
//! fields, and reports the result as a set of typed tables rather than a
//! single pass/fail verdict: frames that decoded, annotated field spans,
//! every raw sampled bit, and errors bucketed by kind.
//!
//! This crate only decodes a stream that is already digital. Turning
//! analog logic-analyzer samples into digital levels is a separate,
//! optional front end: [`digitizer`].
//!
//! Usage is simple:
//! ```
//! use can_decode::{Decoder, DecoderOptions, TransitionStream};
//!
//! // Transition times, in bit-time units, plus the level in effect before
//! // the first one.
//! let x0 = false;
//! let dt: Vec<f64> = vec![/* ... */];
//! let stream = TransitionStream::new(x0, dt).unwrap();
//! let mut decoder = Decoder::new(stream, DecoderOptions::default(), None);
//! decoder.run();
//! for frame in decoder.frames() {
//!     // ...
//! }
//! ```
mod decoder;
pub mod digitizer;
mod error;
mod frame;
mod sampler;
mod stream;

pub use decoder::{Decoder, DecoderOptions, Hla};
pub use error::{CanError, ErrorKind, FrameError};
pub use frame::{Annotation, Frame, CRC15_MASK, CRC15_POLY};
pub use stream::TransitionStream;
