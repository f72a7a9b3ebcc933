//! Multi-bus mixer
//!
//! Five fixed buses (voice, music, sfx, environment, master), each with
//! volume, pan, mute, solo, routing and an ordered effect chain. The
//! [`BusGraph`] sums every audible bus into one buffer.

mod bus;
mod command;
mod graph;
mod shared;

pub use bus::{BusConfiguration, BusId, BusState, BusStatus};
pub use command::Command;
pub use graph::{BusGraph, MixReport};
pub use shared::SharedBusGraph;
