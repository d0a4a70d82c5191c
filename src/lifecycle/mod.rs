//! Process lifecycle: shutdown coordination and OS signal handling.

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
