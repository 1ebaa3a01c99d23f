//! Audio capability: buffered interleaved PCM output.

use handplay_types::Result;

/// Output stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    /// Frames per buffer.
    pub samples: usize,
    pub freq: u32,
    pub channels: u8,
}

impl AudioSpec {
    /// Interleaved `i16` values that make up one buffer.
    pub const fn buffer_len(&self) -> usize {
        self.samples * self.channels as usize
    }
}

/// Audio output backend trait.
///
/// The driver owns a fixed ring of `buffer_count()` buffers. Callers feed
/// one buffer per `output` call and use the returned backlog to pace
/// themselves.
pub trait AudioDriver {
    fn buffer_count(&self) -> usize;

    fn open(&mut self, spec: AudioSpec) -> Result<()>;

    fn close(&mut self);

    /// Queue `pcm` (interleaved, `spec.buffer_len()` values) and return the
    /// number of queued frames still waiting, minus the buffer currently
    /// playing. `None` drains the queue and returns 0.
    fn output(&mut self, pcm: Option<&[i16]>) -> Result<usize>;

    /// Queued frames without submitting anything.
    fn backlog(&self) -> usize;
}
