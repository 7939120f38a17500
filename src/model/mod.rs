//! Pure data structures shared by the coordinator, the stores and the remote services.

pub mod cart_line;

pub use cart_line::*;
