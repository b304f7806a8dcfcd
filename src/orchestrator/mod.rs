//! Run lifecycle orchestration.
//!
//! Owns the command loop that serializes Generate/Cancel/Quit requests from
//! the UI, drives the process engine, and emits structured events back to
//! the presentation layer. Post-run processing (result artifact read-back)
//! also lives here.

mod controller;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
