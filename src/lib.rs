//! Regime transition engine.
//!
//! A finite-state machine over five market-sentiment regimes: ping-pong
//! autoplay, path-walking navigation to non-adjacent regimes, and
//! direction-aware strategy selection for the view layer.

pub mod animator;
pub mod autoplay;
pub mod catalog;
pub mod config;
pub mod layout;
pub mod logging;
pub mod path;
pub mod session;
pub mod strategy;
