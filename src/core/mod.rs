pub mod catalog;
pub mod config;
pub mod generation;
pub mod message;
pub mod navigation;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;
