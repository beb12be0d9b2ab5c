//! Chatdeck is the session and model-configuration core of a terminal client
//! for chatting with several LLM providers.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the model catalog, the session factory, the persisted
//!   state and the startup reconciliation that keeps that state consistent.
//! - [`cli`] parses command-line arguments, runs startup, and prints or edits
//!   the reconciled state.
//! - [`utils`] holds small helpers such as launch-location parsing.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod cli;
pub mod core;
pub mod utils;
