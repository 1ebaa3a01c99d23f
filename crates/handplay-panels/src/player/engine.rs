//! Contract between the player panel and a media engine.
//!
//! The engine decodes and plays on its own threads. The panel talks to it
//! through a handle: commands go in, property changes come out of a
//! non-blocking event queue, and the engine rings the [`Waker`] whenever new
//! events are ready so the UI loop polls promptly.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use handplay_core::Waker;
use handplay_platform::AudioSpec;
use handplay_types::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Relative seek in seconds.
    Seek(f64),
    CyclePause,
    /// Stop playback; the engine answers with [`EngineEvent::Shutdown`].
    Quit,
}

/// Observed playback properties.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Pause(bool),
    /// Seconds.
    Duration(f64),
    /// Playback position, 0 to 100.
    PercentPos(f64),
    MediaTitle(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PropertyChange(Property),
    /// The engine stopped and is ready to be terminated.
    Shutdown,
}

/// Counters shown by the performance overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Direct-rendering buffers in use and their total size.
    pub dr_count: u32,
    pub dr_bytes: u64,
    /// Demuxer bytes buffered ahead of the playback position.
    pub fw_bytes: u64,
    pub total_bytes: u64,
}

/// Called once on an engine thread with fresh stats.
pub type StatsReply = Box<dyn FnOnce(EngineStats) + Send>;

/// One decoded RGBA8888 picture.
#[derive(Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Handle to a running media engine.
pub trait MediaEngine: Send {
    // -----------------------------------------------------------------------
    // Core methods (required)
    // -----------------------------------------------------------------------

    /// Start playing `path`.
    fn load(&mut self, path: &Path) -> Result<()>;

    fn command(&mut self, cmd: EngineCommand) -> Result<()>;

    /// Next pending event, without blocking.
    fn poll_event(&mut self) -> Option<EngineEvent>;

    /// Ring `waker` whenever new events are queued.
    fn set_waker(&mut self, waker: Waker);

    /// Gather stats on an engine thread and hand them to `reply`. A request
    /// may be dropped unanswered when the engine shuts down.
    fn request_stats(&mut self, reply: StatsReply);

    /// Stop every engine thread and release the engine. May block.
    fn terminate(self: Box<Self>);

    // -----------------------------------------------------------------------
    // Extended (optional, with defaults)
    // -----------------------------------------------------------------------

    /// Output format of [`take_audio`](Self::take_audio), when the media has
    /// sound.
    fn audio_spec(&self) -> Option<AudioSpec> {
        None
    }

    /// One buffer of interleaved PCM, if decoded ahead.
    fn take_audio(&mut self) -> Option<Vec<i16>> {
        None
    }

    /// The newest decoded picture, if it changed since the last call.
    fn take_video_frame(&mut self) -> Option<VideoFrame> {
        None
    }
}

/// Creates a fresh engine for each opened file. Shared with other threads,
/// so it must be `Send + Sync`.
pub type EngineFactory = Arc<dyn Fn() -> Result<Box<dyn MediaEngine>> + Send + Sync>;
