//! Long-lived data shared between the host and the systems.
//!
//! Overview
//! - `gameconfig` – engine settings loaded from an INI file
//! - `input` – action input state and JSON key bindings
//! - `screensize` – resolution currently applied by the host
//! - `surface` – frame surface trait and a recording implementation
//! - `worldtime` – simulation time and delta
pub mod gameconfig;
pub mod input;
pub mod screensize;
pub mod surface;
pub mod worldtime;
