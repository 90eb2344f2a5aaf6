//! Terminal front end: CLI, logging, effect execution and rendering.
mod app;
mod cli;
mod effects;
mod input;
mod logging;
mod ui;

pub use app::run_app;
