//! Push/drain protocol shared by the encoder and the decoder
//!
//! Both codec directions follow the same cycle: hand one unit (or the
//! end-of-stream marker) to the codec, then pull results until the codec
//! reports that it needs more input or that it is finished.

use serde::Serialize;

use crate::error::Result;

/// Outcome of one retrieval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drained {
    /// A unit was written into the output buffer
    Ready,
    /// The codec needs more input before it can produce anything
    WouldBlock,
    /// The codec has been flushed and will produce nothing more
    EndOfStream,
}

/// A codec context driven through send/receive.
pub trait CodecEngine {
    /// What goes in: a frame for an encoder, a packet for a decoder
    type Input;
    /// What comes out: a packet for an encoder, a frame for a decoder
    type Output;

    /// Queue one unit. `None` signals end of stream.
    fn send(&mut self, input: Option<&Self::Input>) -> Result<()>;

    /// Try to retrieve one unit into `output`.
    ///
    /// "Would block" and "end of stream" are reported through [`Drained`];
    /// every other failure is an `Err`.
    fn receive(&mut self, output: &mut Self::Output) -> Result<Drained>;

    /// Drop the payload held by `output` so the buffer can be reused.
    fn release(_output: &mut Self::Output) {}
}

/// Counters for one submit/drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainStats {
    /// Units retrieved and handed to the callback
    pub produced: usize,
    /// Retrieval attempts made, successful or not
    pub attempts: usize,
    /// Per-unit failures: a refused send or a failed retrieval
    pub failed: usize,
    /// The codec reported end of stream
    pub reached_eof: bool,
}

impl DrainStats {
    pub fn merge(&mut self, other: DrainStats) {
        self.produced += other.produced;
        self.attempts += other.attempts;
        self.failed += other.failed;
        self.reached_eof |= other.reached_eof;
    }
}

/// Submit one unit (or end of stream) and drain everything it produces.
///
/// A refused send is logged and counted, nothing is drained for it. A
/// failed retrieval is logged, counted, and ends this drain pass. Errors
/// returned by `on_output` end the pass and are propagated to the caller.
/// `output` is released after every retrieved unit and on every exit.
pub fn submit<E, F>(
    engine: &mut E,
    input: Option<&E::Input>,
    output: &mut E::Output,
    mut on_output: F,
) -> Result<DrainStats>
where
    E: CodecEngine,
    F: FnMut(&mut E::Output) -> Result<()>,
{
    let mut stats = DrainStats::default();

    if let Err(e) = engine.send(input) {
        tracing::warn!(flush = input.is_none(), "codec refused input: {}", e);
        stats.failed += 1;
        return Ok(stats);
    }

    loop {
        stats.attempts += 1;
        match engine.receive(output) {
            Ok(Drained::Ready) => {
                stats.produced += 1;
                let handled = on_output(output);
                E::release(output);
                handled?;
            }
            Ok(Drained::WouldBlock) => break,
            Ok(Drained::EndOfStream) => {
                stats.reached_eof = true;
                break;
            }
            Err(e) => {
                tracing::warn!("codec retrieval failed: {}", e);
                stats.failed += 1;
                break;
            }
        }
    }

    E::release(output);
    Ok(stats)
}
