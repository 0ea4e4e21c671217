//! Adapters at the edges of the hexagon.
//!
//! - [`inbound`]: the command-line driver
//! - [`outbound`]: storage backends

pub mod inbound;
pub mod outbound;
