//! Logging infrastructure for structured console and file output.

mod logger;
mod subscriber;
mod utils;

pub use logger::{Logger, TargetEntry, TargetStatus};
pub use subscriber::init_subscriber;
