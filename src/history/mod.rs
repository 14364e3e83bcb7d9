//! Reading history
//!
//! Bounded append log of stored readings, its persistence backends and the
//! named time windows used to slice it.

mod backend;
mod store;
mod window;

pub use backend::*;
pub use store::*;
pub use window::*;
