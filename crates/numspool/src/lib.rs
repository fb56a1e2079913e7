#![doc = include_str!("../README.md")]

mod artifact;
mod config;
mod error;
mod expand;
mod filter;
mod partition;
mod pool;
mod retention;
mod session;
mod size;
mod writer;

pub use crate::artifact::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::expand::*;
pub use crate::filter::*;
pub use crate::partition::*;
pub use crate::retention::*;
pub use crate::session::*;
pub use crate::size::*;
pub use crate::writer::*;
