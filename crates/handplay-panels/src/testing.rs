//! Scripted media engine for panel tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use handplay_core::Waker;
use handplay_platform::AudioSpec;
use handplay_types::{HandplayError, Result};

use crate::player::engine::{
    EngineCommand, EngineEvent, EngineFactory, EngineStats, MediaEngine, StatsReply, VideoFrame,
};

#[derive(Default)]
struct Script {
    created: usize,
    fail_load: bool,
    loaded: Vec<PathBuf>,
    commands: Vec<EngineCommand>,
    events: VecDeque<EngineEvent>,
    stats_requests: Vec<StatsReply>,
    audio_spec: Option<AudioSpec>,
    audio: VecDeque<Vec<i16>>,
    frames: VecDeque<VideoFrame>,
    waker: Option<Waker>,
    terminated: usize,
}

/// Test-side handle to every engine created by [`scripted`]'s factory.
#[derive(Clone)]
pub struct EngineScript {
    state: Arc<Mutex<Script>>,
}

struct ScriptedEngine {
    state: Arc<Mutex<Script>>,
}

fn lock(state: &Mutex<Script>) -> MutexGuard<'_, Script> {
    state.lock().unwrap()
}

/// An engine factory plus the handle that scripts it.
pub fn scripted() -> (EngineFactory, EngineScript) {
    let state = Arc::new(Mutex::new(Script::default()));
    let shared = Arc::clone(&state);
    let factory: EngineFactory = Arc::new(move || {
        lock(&shared).created += 1;
        Ok(Box::new(ScriptedEngine {
            state: Arc::clone(&shared),
        }) as Box<dyn MediaEngine>)
    });
    (factory, EngineScript { state })
}

/// A factory whose engines can never be created.
pub fn broken() -> EngineFactory {
    Arc::new(|| Err(HandplayError::Engine("no decoder".into())))
}

impl EngineScript {
    pub fn created(&self) -> usize {
        lock(&self.state).created
    }

    pub fn fail_load(&self) {
        lock(&self.state).fail_load = true;
    }

    pub fn loaded(&self) -> Vec<PathBuf> {
        lock(&self.state).loaded.clone()
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        lock(&self.state).commands.clone()
    }

    pub fn terminated(&self) -> usize {
        lock(&self.state).terminated
    }

    /// Queue an event and ring the waker like a real engine would.
    pub fn emit(&self, event: EngineEvent) {
        let waker = {
            let mut s = lock(&self.state);
            s.events.push_back(event);
            s.waker.clone()
        };
        if let Some(w) = waker {
            w.wake();
        }
    }

    pub fn set_audio(&self, spec: AudioSpec, buffers: usize) {
        let mut s = lock(&self.state);
        s.audio_spec = Some(spec);
        for i in 0..buffers {
            s.audio.push_back(vec![i as i16; spec.buffer_len()]);
        }
    }

    pub fn audio_left(&self) -> usize {
        lock(&self.state).audio.len()
    }

    pub fn push_frame(&self, frame: VideoFrame) {
        lock(&self.state).frames.push_back(frame);
    }

    pub fn stats_requests(&self) -> usize {
        lock(&self.state).stats_requests.len()
    }

    /// Answer every outstanding stats request from the calling thread.
    pub fn answer_stats(&self, stats: EngineStats) -> usize {
        let replies = std::mem::take(&mut lock(&self.state).stats_requests);
        let n = replies.len();
        for reply in replies {
            reply(stats);
        }
        n
    }
}

impl MediaEngine for ScriptedEngine {
    fn load(&mut self, path: &Path) -> Result<()> {
        let mut s = lock(&self.state);
        if s.fail_load {
            return Err(HandplayError::Engine(format!("cannot open {}", path.display())));
        }
        s.loaded.push(path.to_path_buf());
        Ok(())
    }

    fn command(&mut self, cmd: EngineCommand) -> Result<()> {
        let mut s = lock(&self.state);
        if cmd == EngineCommand::Quit {
            s.events.push_back(EngineEvent::Shutdown);
        }
        s.commands.push(cmd);
        Ok(())
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        lock(&self.state).events.pop_front()
    }

    fn set_waker(&mut self, waker: Waker) {
        lock(&self.state).waker = Some(waker);
    }

    fn request_stats(&mut self, reply: StatsReply) {
        lock(&self.state).stats_requests.push(reply);
    }

    fn terminate(self: Box<Self>) {
        lock(&self.state).terminated += 1;
    }

    fn audio_spec(&self) -> Option<AudioSpec> {
        lock(&self.state).audio_spec
    }

    fn take_audio(&mut self) -> Option<Vec<i16>> {
        lock(&self.state).audio.pop_front()
    }

    fn take_video_frame(&mut self) -> Option<VideoFrame> {
        lock(&self.state).frames.pop_front()
    }
}
