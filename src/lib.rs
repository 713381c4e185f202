//! MSpace - interior design visualizer for a single flat
//!
//! This crate provides:
//! - A catalog of rooms and design styles with their generation prompts
//! - A Gemini image generation client
//! - A session controller caching one rendering per room × style
//! - PNG export, an interactive CLI and an HTTP API

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod export;
pub mod generation;
pub mod paths;
pub mod server;
pub mod session;

pub use config::Config;
