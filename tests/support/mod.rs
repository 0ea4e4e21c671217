#![allow(dead_code)]

pub mod architecture;
pub mod exchange;

pub use exchange::Exchange;
