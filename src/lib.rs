//! Simple Audio Record - microphone recording with a live level meter
//!
//! This crate records the current audio input to a 16-bit mono 44.1 kHz WAV
//! file, publishes a smoothed input level while recording, follows input
//! route changes, and plays the recording back.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Audio formats, level math, route snapshots, session state and config
//! - **Application**: Capture pipeline, session controller, level publisher,
//!   playback controller and the port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rubato, hound, rodio, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
