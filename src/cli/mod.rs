pub mod args;
pub mod commands;

pub use args::{Cli, Commands, LocationArgs};
pub use commands::run;
