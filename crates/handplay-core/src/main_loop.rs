//! The UI thread's control loop.
//!
//! One iteration:
//! 1. `on_poll` of the current panel
//! 2. drain the dispatch queue
//! 3. on a frame boundary: key transitions, native events, redraw
//! 4. stop when no panel is left
//! 5. sleep until the next frame or an early wakeup

use std::time::Instant;

use handplay_platform::PlatformEvent;

use crate::context::UiContext;
use crate::dispatch::Budget;
use crate::wakeup::WakeReason;

impl UiContext {
    /// Run until the panel stack is empty.
    pub fn main_loop(&mut self) {
        log::info!("Entering main loop");
        let mut frames = 0u64;
        loop {
            if self.run_iteration_at(Instant::now()) {
                frames += 1;
            }
            if self.stack.is_empty() {
                break;
            }
            self.wait_next_frame();
        }
        log::info!("Main loop finished after {frames} frames");
    }

    /// Steps 1-3 of one iteration with `now` as the wall clock. Returns true
    /// when a frame boundary was crossed.
    pub fn run_iteration_at(&mut self, now: Instant) -> bool {
        self.stack.poll(&mut self.ui);
        self.apply_navigation();

        let queue = self.ui.dispatch();
        queue.process_with(self, Budget::Drain, UiContext::apply_navigation);

        if !self.ui.clock.advance_at(now) {
            return false;
        }
        self.handle_platform_keys();
        self.handle_platform_events();
        self.handle_redraw();
        true
    }

    /// Block until the next frame is due or something wakes the loop.
    pub fn wait_next_frame(&self) -> WakeReason {
        self.ui.gate.wait_until(self.ui.clock.next_frame())
    }

    fn handle_platform_keys(&mut self) {
        let new_bits = self.ui.platform_mut().poll_keys();
        let old_bits = self.ui.key_bits;
        if new_bits == old_bits {
            return;
        }
        for key in old_bits.transitions(new_bits) {
            log::trace!("Key {:?} {:?}", key.code, key.state);
            self.stack.key(&mut self.ui, key);
            self.apply_navigation();
        }
        self.ui.key_bits = new_bits;
    }

    fn handle_platform_events(&mut self) {
        for event in self.ui.platform_mut().poll_events() {
            match event {
                PlatformEvent::Quit => {
                    log::info!("Quit requested by platform");
                    self.stack.pop_all(&mut self.ui);
                }
            }
        }
        self.apply_navigation();
    }

    fn handle_redraw(&mut self) {
        if !self.ui.want_redraw {
            return;
        }
        // Cleared before drawing so an `invalidate` from `on_draw` asks for
        // another frame.
        self.ui.want_redraw = false;

        if let Err(e) = self.ui.render().render_start() {
            log::warn!("render_start failed: {e}");
            self.ui.want_redraw = true;
            return;
        }
        if let Err(e) = self.stack.draw(&mut self.ui) {
            log::warn!("Panel draw failed: {e}");
        }
        if let Err(e) = self.ui.render().render_end() {
            log::warn!("render_end failed: {e}");
        }
    }
}
