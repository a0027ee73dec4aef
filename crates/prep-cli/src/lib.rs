//! Library side of the `prep` binary: configuration, logging and argument
//! parsing helpers.

pub mod config;
pub mod input;
pub mod logging;
pub mod lookup;
