//! Cassettes: recorded port traffic used to replay runs in tests.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;
