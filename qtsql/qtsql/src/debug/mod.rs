//! Internal machinery for collecting debug logs of a compilation.
#![doc(hidden)]

mod log;
mod messages;

pub use self::log::*;
pub use messages::MessageLogger;
