//! Engine statistics overlay.
//!
//! Stats are gathered on an engine thread. The reply posts a task to the UI
//! dispatch queue which swaps the displayed lines; the handles of those
//! posts are kept so `stop` can cancel whatever has not run yet.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use handplay_core::{PostHandle, Ui, UiContext};
use handplay_types::{Color, Result};

use super::PlayerPanel;
use super::engine::{EngineStats, MediaEngine};

const DRAW_X: f32 = 30.0;
const DRAW_Y: f32 = 30.0;
const FONT_SIZE: u16 = 15;
const TEXT_COLOR: Color = Color::from_abgr(0xff00_00ff);
/// Requests in flight before polling pauses.
const MAX_PENDING: usize = 2;

#[derive(Default)]
struct Posts {
    stopped: bool,
    next_id: u64,
    /// Posted swaps that have not run yet, by request id.
    handles: Vec<(u64, PostHandle)>,
}

pub struct PerfOverlay {
    interval: Duration,
    last_request: Option<Instant>,
    pending: usize,
    lines: Vec<String>,
    posts: Arc<Mutex<Posts>>,
}

fn lock(posts: &Mutex<Posts>) -> MutexGuard<'_, Posts> {
    posts.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PerfOverlay {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: None,
            pending: 0,
            lines: Vec::new(),
            posts: Arc::default(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Ask the engine for fresh stats once per interval.
    pub fn poll(&mut self, ui: &Ui, engine: &mut dyn MediaEngine) {
        if self.pending >= MAX_PENDING {
            return;
        }
        let now = ui.frame_time();
        if self
            .last_request
            .is_some_and(|at| now.saturating_duration_since(at) < self.interval)
        {
            return;
        }
        self.last_request = Some(now);
        self.pending += 1;

        let id = {
            let mut posts = lock(&self.posts);
            posts.next_id += 1;
            posts.next_id
        };
        let posts = Arc::clone(&self.posts);
        let dispatch = ui.dispatch();
        engine.request_stats(Box::new(move |stats| {
            let lines = stats_lines(&stats);
            let mut posts = lock(&posts);
            if posts.stopped {
                return;
            }
            // Held across the post: `stop` must see every handle.
            let handle = dispatch.post(move |ctx: &mut UiContext| {
                ctx.with_panel::<PlayerPanel, _>(|panel, ui| {
                    if let Some(perf) = panel.perf.as_mut() {
                        perf.swap(id, lines, ui);
                    }
                });
            });
            posts.handles.push((id, handle));
        }));
    }

    fn swap(&mut self, id: u64, lines: Vec<String>, ui: &mut Ui) {
        lock(&self.posts).handles.retain(|(pending, _)| *pending != id);
        self.pending = self.pending.saturating_sub(1);
        self.lines = lines;
        ui.invalidate();
    }

    /// Cancel every swap that was posted but has not run. Replies arriving
    /// later are dropped.
    pub fn stop(&mut self, ui: &Ui) {
        let mut posts = lock(&self.posts);
        posts.stopped = true;
        let cancelled = posts
            .handles
            .drain(..)
            .filter(|(_, handle)| ui.run_cancel(*handle))
            .count();
        if cancelled > 0 {
            log::debug!("Cancelled {cancelled} pending stats updates");
        }
        self.pending = 0;
    }

    pub fn draw(&self, ui: &mut Ui) -> Result<()> {
        if self.lines.is_empty() {
            return Ok(());
        }
        let Some(font) = ui.font() else {
            return Ok(());
        };
        let render = ui.render();
        let mut y = DRAW_Y;
        for line in &self.lines {
            render.draw_text(font, FONT_SIZE, TEXT_COLOR, DRAW_X, y, line)?;
            y += f32::from(FONT_SIZE);
        }
        Ok(())
    }
}

fn stats_lines(stats: &EngineStats) -> Vec<String> {
    vec![
        format!("dr = {} x {}", stats.dr_count, format_bytes(stats.dr_bytes)),
        format!("fw_bytes = {}", format_bytes(stats.fw_bytes)),
        format!("total_bytes = {}", format_bytes(stats.total_bytes)),
    ]
}

/// Binary units with one decimal above a kibibyte: `512 B`, `1.5 KiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
