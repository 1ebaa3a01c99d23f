//! The two panels of the handplay media player.
//!
//! [`FilesPanel`] browses a directory tree and opens files in
//! [`PlayerPanel`], which drives a [`MediaEngine`] and draws its on-screen
//! controls. Both run on the `handplay-core` panel runtime.

pub mod files;
pub mod player;

#[cfg(test)]
mod testing;

pub use files::{FilesInit, FilesPanel};
pub use player::engine::{
    EngineCommand, EngineEvent, EngineFactory, EngineStats, MediaEngine, Property, StatsReply,
    VideoFrame,
};
pub use player::{PlayerInit, PlayerPanel};
