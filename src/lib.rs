#![forbid(unsafe_code)]

pub mod app;
pub mod chapters;
pub mod cli;
pub mod config;
pub mod fallback;
pub mod finalize;
pub mod generation;
pub mod interaction;
pub mod logging;
pub mod manuscript;
pub mod openai;
pub mod planning;
pub mod project;
pub mod prompts;
pub mod render;
pub mod store;
pub mod suggestions;
pub mod workflow;
