//! Turns key edges into click and auto-repeat actions.
//!
//! A panel keeps one [`KeyRepeat`] and a static binding table. Key
//! transitions go through [`KeyRepeat::dispatch`], and the panel's poll hook
//! calls [`KeyRepeat::poll`] with the frame time. Both hand back the action
//! to perform and how many repeat pulses it stands for; callers scale their
//! effect by `max(repeat, 1)`.

use std::time::{Duration, Instant};

use handplay_types::config::RepeatConfig;
use handplay_types::{Key, KeyCode, KeyState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding<A> {
    pub code: KeyCode,
    pub action: A,
    /// Holding the key auto-repeats after the trigger delay.
    pub repeatable: bool,
}

impl<A> KeyBinding<A> {
    pub const fn click(code: KeyCode, action: A) -> Self {
        Self {
            code,
            action,
            repeatable: false,
        }
    }

    pub const fn repeat(code: KeyCode, action: A) -> Self {
        Self {
            code,
            action,
            repeatable: true,
        }
    }
}

/// An action to perform. `repeat` is 0 for a plain click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFire<A> {
    pub action: A,
    pub repeat: u32,
}

#[derive(Debug, Clone, Copy)]
struct Held<A> {
    action: A,
    pressed: Instant,
    handled: u32,
}

#[derive(Debug, Clone)]
pub struct KeyRepeat<A> {
    trigger_delay: Duration,
    repeat_delay: Duration,
    held: Option<Held<A>>,
}

impl<A: Copy> KeyRepeat<A> {
    pub fn new(config: RepeatConfig) -> Self {
        Self {
            trigger_delay: config.trigger_delay(),
            repeat_delay: config.repeat_delay().max(Duration::from_millis(1)),
            held: None,
        }
    }

    pub fn dispatch(
        &mut self,
        key: Key,
        now: Instant,
        bindings: &[KeyBinding<A>],
    ) -> Option<KeyFire<A>> {
        let binding = bindings.iter().find(|b| b.code == key.code)?;
        let click = KeyFire {
            action: binding.action,
            repeat: 0,
        };

        if !binding.repeatable {
            return (key.state == KeyState::Up).then_some(click);
        }

        match key.state {
            KeyState::Down => {
                self.held = Some(Held {
                    action: binding.action,
                    pressed: now,
                    handled: 0,
                });
                None
            }
            KeyState::Up => {
                // A release before the first pulse counts as a click.
                let pulsed = self.held.is_some_and(|h| h.handled > 0);
                self.held = None;
                (!pulsed).then_some(click)
            }
        }
    }

    /// Emit the repeat pulses that became due since the last poll, batched
    /// into one fire.
    pub fn poll(&mut self, now: Instant) -> Option<KeyFire<A>> {
        let held = self.held.as_mut()?;
        let elapsed = now
            .checked_duration_since(held.pressed)?
            .checked_sub(self.trigger_delay)?;
        let total = (elapsed.as_nanos() / self.repeat_delay.as_nanos()) as u32;
        if total <= held.handled {
            return None;
        }
        let repeat = total - held.handled;
        held.handled = total;
        Some(KeyFire {
            action: held.action,
            repeat,
        })
    }

    pub fn reset(&mut self) {
        self.held = None;
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }
}
