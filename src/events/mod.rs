//! Events exchanged between systems and the host.
//!
//! Submodules:
//! - [`bus`] – named events with priority-ordered handlers, queued through a channel
//! - [`collision`] – contacts reported by the collision system over the bus
//! - [`screen`] – resolution change requests sent to the host over a channel
pub mod bus;
pub mod collision;
pub mod screen;
