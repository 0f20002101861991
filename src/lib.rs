//! Encodewatch - ffmpeg transcode runner with live progress
//!
//! This library crate exposes the configuration layer for integration testing.

pub mod config;
