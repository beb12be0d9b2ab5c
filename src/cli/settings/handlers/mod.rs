//! Setting handlers for the stored defaults.

pub mod generation;
pub mod simple;

pub use generation::*;
pub use simple::*;
