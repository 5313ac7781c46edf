//! Startup sequencing
//!
//! One awaited call takes a host from raw configuration sources to a
//! ready-to-use data access handle.

mod sequencer;

pub use sequencer::{
    bootstrap, bootstrap_blocking, BootstrapError, BootstrapResult, Bootstrapper,
};
