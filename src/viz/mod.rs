//! A terminal front end for watching the agent learn
//!
//! The [`App`] only draws and reads keys. Whoever owns the agent receives
//! [`Command`]s, runs it, and reports back with [`Update`]s; pacing the run is
//! up to that driver.

mod app;
mod components;
mod tui;
mod util;

pub use app::{App, Command, State, Update};
