//! Application module
//!
//! Wires the pod watcher to the shutdown handler and manages the lifecycle
//! of the background tasks.

pub mod builder;
pub mod core;
pub mod tasks;

pub use builder::ApplicationBuilder;
pub use self::core::Application;
pub use self::core::ApplicationServices;
