pub mod check;
pub mod cli;
pub mod daemon;

pub use check::*;
pub use cli::*;
pub use daemon::*;
