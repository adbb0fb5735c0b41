//! Run loop (C5) and result tables (C6): drives the sampler and frame
//! parser across an entire transition stream and collects what comes out.

use std::collections::HashMap;

use crate::error::{CanError, EndOfStream, ErrorKind};
use crate::frame::{Annotation, Frame, FrameCursor};
use crate::sampler::Sampler;
use crate::stream::TransitionStream;

/// A high-level analysis callback: given a successfully decoded frame,
/// returns a human-readable interpretation, or `None` if the frame could
/// not be interpreted at this layer.
pub type Hla = dyn Fn(&Frame) -> Option<String>;

/// Tuning knobs for a decode run, beyond the transition stream itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecoderOptions {
    /// CAN bus data rate, in bits per second. Used only when constructing a
    /// [`Decoder`] from wall-clock times via [`Decoder::from_seconds`].
    pub rate_bps: f64,
    /// Length, in bits, of the sampling window built at each candidate
    /// frame start. 160 bits covers the longest possible extended frame
    /// after bit-stuffing plus its interframe space.
    pub nbits: usize,
    /// Maximum separation, in bit-time units, between two transitions for
    /// them to be treated as a glitch pair and skipped while looking for a
    /// frame start.
    pub max_glitch: f64,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            rate_bps: 500_000.0,
            nbits: 160,
            max_glitch: 0.1,
        }
    }
}

/// Decodes a CAN 2.0 A/B transition stream into frames, annotations, and
/// per-kind error tables.
///
/// A `Decoder` is built once, run once via [`Decoder::run`], and then read
/// through its table accessors. Running twice re-decodes from scratch and
/// replaces the tables.
pub struct Decoder {
    stream: TransitionStream,
    sampler: Sampler,
    name: Option<String>,
    hla: Option<Box<Hla>>,

    cursor: usize,
    frames: Vec<Frame>,
    annotations: Vec<Annotation>,
    samples: Vec<(f32, u8)>,
    errors: HashMap<ErrorKind, Vec<f32>>,
    hla_annotations: Vec<(f32, f32, String)>,
    hla_error_count: usize,
}

impl Decoder {
    /// Builds a decoder directly from a bit-time-unit transition stream.
    pub fn new(stream: TransitionStream, opts: DecoderOptions, name: Option<String>) -> Self {
        Decoder {
            stream,
            sampler: Sampler {
                nbits: opts.nbits,
                max_glitch: opts.max_glitch,
            },
            name,
            hla: None,
            cursor: 0,
            frames: Vec::new(),
            annotations: Vec::new(),
            samples: Vec::new(),
            errors: HashMap::new(),
            hla_annotations: Vec::new(),
            hla_error_count: 0,
        }
    }

    /// Builds a decoder from wall-clock transition times in seconds,
    /// rescaling by `opts.rate_bps`. Returns [`CanError::NotMonotonic`] if
    /// `times` is not strictly increasing.
    pub fn from_seconds(
        times: &[f64],
        x0: bool,
        t0: f64,
        opts: DecoderOptions,
        name: Option<String>,
    ) -> Result<Self, CanError> {
        let stream = TransitionStream::from_seconds(times, x0, t0, opts.rate_bps)?;
        Ok(Self::new(stream, opts, name))
    }

    /// Installs a high-level analysis callback, applied to every
    /// successfully decoded frame once [`run`](Decoder::run) finishes.
    pub fn with_hla(mut self, hla: Box<Hla>) -> Self {
        self.hla = Some(hla);
        self
    }

    /// The name given to this decoder's bus, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Decodes the entire transition stream, replacing any previous
    /// results.
    pub fn run(&mut self) {
        self.cursor = 0;
        self.frames.clear();
        self.annotations.clear();
        self.samples.clear();
        self.errors.clear();
        self.hla_annotations.clear();
        self.hla_error_count = 0;

        let mut window = match self.sampler.sample(&self.stream, self.cursor) {
            Ok(window) => window,
            Err(EndOfStream) => {
                self.run_hla();
                return;
            }
        };

        loop {
            let mut frame_cursor = FrameCursor::new(&window);
            let outcome = frame_cursor.parse_frame();

            self.samples.extend(frame_cursor.raw_samples.drain(..));
            self.annotations.extend(frame_cursor.annotations.drain(..));

            match outcome {
                Ok(frame) => {
                    self.frames.push(frame);
                }
                Err(err) => {
                    let t_error = frame_cursor.last_sample_t();
                    self.errors.entry(err.kind()).or_default().push(t_error);
                    self.annotations.push(Annotation {
                        t1: t_error - 0.5,
                        t2: t_error + 0.5,
                        label: "!".to_string(),
                    });
                }
            }

            let advance_idx = frame_cursor.bits_consumed() - 1;
            self.cursor = window.cursor + window.sample_idx[advance_idx];
            window = match self.sampler.sample(&self.stream, self.cursor) {
                Ok(next_window) => next_window,
                Err(EndOfStream) => break,
            };
        }

        self.run_hla();
    }

    fn run_hla(&mut self) {
        let Some(hla) = self.hla.as_ref() else {
            return;
        };
        for frame in &self.frames {
            let interpreted = hla(frame);
            let label = interpreted.unwrap_or_else(|| {
                self.hla_error_count += 1;
                "???".to_string()
            });
            self.hla_annotations.push((frame.t1, frame.t2, label));
        }
    }

    /// Successfully decoded frames, in capture order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Labeled field annotations across the whole run, including the "!"
    /// markers left at each parse failure.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Every raw sampled bit consumed while parsing, as `(time, level)`
    /// pairs. `level` is 0 or 1, with bit-1 (`0b10`) set on a valid stuff
    /// bit and bit-2 (`0b100`) set on an invalid one.
    pub fn samples(&self) -> &[(f32, u8)] {
        &self.samples
    }

    /// Error timestamps, bucketed by [`ErrorKind`].
    pub fn errors(&self) -> &HashMap<ErrorKind, Vec<f32>> {
        &self.errors
    }

    /// High-level interpretations of each decoded frame, in the same order
    /// as [`frames`](Decoder::frames). Empty if no HLA callback was
    /// installed.
    pub fn hla_annotations(&self) -> &[(f32, f32, String)] {
        &self.hla_annotations
    }

    /// Number of frames the HLA callback failed to interpret.
    pub fn hla_error_count(&self) -> usize {
        self.hla_error_count
    }
}
