//! Command-line front end.
mod app;
mod main;
mod preview;

pub use app::*;
pub use main::*;
pub use preview::*;
