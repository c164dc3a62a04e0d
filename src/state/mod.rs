//! State module for tracking walk progress
//!
//! # Components
//!
//! - `WalkPhase`: where a channel walker is in its fetch/parse/evaluate cycle
//! - `StopReason`: why a walker reached its terminal phase
//! - `ChannelState`: the per-channel cursor, high-water mark and dedup set

mod channel_state;
mod walk_phase;

// Re-export main types
pub use channel_state::{Admission, ChannelState};
pub use walk_phase::{StopReason, WalkPhase};
