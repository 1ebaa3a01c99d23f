//! PCM output through an SDL audio queue.

use sdl2::AudioSubsystem;
use sdl2::audio::{AudioQueue, AudioSpecDesired};

use handplay_platform::{AudioDriver, AudioSpec};
use handplay_types::{HandplayError, Result};

/// Buffers the queue is allowed to hold ahead of playback.
const BUFFER_COUNT: usize = 4;

const SAMPLE_BYTES: usize = std::mem::size_of::<i16>();

pub struct SdlAudio {
    subsystem: AudioSubsystem,
    device: Option<(AudioQueue<i16>, AudioSpec)>,
}

fn audio_err(e: impl ToString) -> HandplayError {
    HandplayError::Audio(e.to_string())
}

/// Frames still queued behind the buffer that is playing.
fn backlog_frames(queued_bytes: usize, spec: &AudioSpec) -> usize {
    let frame_bytes = SAMPLE_BYTES * usize::from(spec.channels.max(1));
    (queued_bytes / frame_bytes).saturating_sub(spec.samples)
}

impl SdlAudio {
    pub fn new(subsystem: AudioSubsystem) -> Self {
        Self {
            subsystem,
            device: None,
        }
    }
}

impl AudioDriver for SdlAudio {
    fn buffer_count(&self) -> usize {
        BUFFER_COUNT
    }

    fn open(&mut self, spec: AudioSpec) -> Result<()> {
        let desired = AudioSpecDesired {
            freq: Some(i32::try_from(spec.freq).map_err(audio_err)?),
            channels: Some(spec.channels),
            samples: Some(u16::try_from(spec.samples).map_err(audio_err)?),
        };
        let queue: AudioQueue<i16> = self
            .subsystem
            .open_queue(None, &desired)
            .map_err(audio_err)?;
        queue.resume();
        log::info!(
            "Audio opened: {} Hz, {} channels, {} frames per buffer",
            spec.freq,
            spec.channels,
            spec.samples
        );
        self.device = Some((queue, spec));
        Ok(())
    }

    fn close(&mut self) {
        if let Some((queue, _)) = self.device.take() {
            queue.pause();
            log::debug!("Audio closed");
        }
    }

    fn output(&mut self, pcm: Option<&[i16]>) -> Result<usize> {
        let (queue, spec) = self
            .device
            .as_ref()
            .ok_or_else(|| HandplayError::Audio("output on a closed device".into()))?;
        let Some(pcm) = pcm else {
            queue.clear();
            return Ok(0);
        };
        queue.queue_audio(pcm).map_err(audio_err)?;
        Ok(backlog_frames(queue.size() as usize, spec))
    }

    fn backlog(&self) -> usize {
        self.device
            .as_ref()
            .map_or(0, |(queue, spec)| backlog_frames(queue.size() as usize, spec))
    }
}
