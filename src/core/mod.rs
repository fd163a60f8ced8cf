//! Satlink - Core types, traits, and constants.
//!
//! This module holds the pieces every other layer agrees on: wire and timing
//! constants, the error taxonomy, lifecycle notices, and the collaborator
//! trait hosts implement to consume what the transport delivers.

mod constants;
mod error;
mod notice;
mod traits;

pub use constants::*;
pub use error::*;
pub use notice::*;
pub use traits::*;
