//! Panel runtime for handplay.
//!
//! A single-threaded, frame-paced loop that owns a stack of panels, drains
//! work posted from other threads, and redraws at most once per frame.
//!
//! - [`frame_clock`]: fixed-interval pacing
//! - [`wakeup`]: coalescing early-wake signal
//! - [`dispatch`]: cross-thread work queue
//! - [`panel`] and [`stack`]: the panel contract and navigation stack
//! - [`key_repeat`]: click and auto-repeat helper for panels
//! - [`context`] and the main loop: everything composed

pub mod context;
pub mod dispatch;
pub mod frame_clock;
pub mod key_repeat;
mod main_loop;
pub mod panel;
pub mod stack;
pub mod wakeup;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

pub use context::{Drivers, Ui, UiContext, UiDispatch};
pub use dispatch::{Budget, DispatchQueue, PostHandle};
pub use frame_clock::FrameClock;
pub use key_repeat::{KeyBinding, KeyFire, KeyRepeat};
pub use panel::{Panel, PanelId};
pub use wakeup::{WakeReason, WakeupGate, Waker};
