pub mod api;
pub mod cache;
pub mod checker;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod digest;
pub mod files;
pub mod fs;
pub mod index;
pub mod inflect;
pub mod model;
pub mod offense;
pub mod output;
pub mod packages;
pub mod parser;
pub mod run;
pub mod style;
pub mod todo;

pub use api::{CheckOptions, PackwallError, check, references, update_todo, validate};
pub use cli::Cli;
pub use commands::{cmd_check, cmd_dump, cmd_init, cmd_update_todo, cmd_validate};
pub use config::Config;
pub use context::RunContext;
pub use files::FileSet;
pub use run::{InterruptFlag, Report, RunDriver, RunStatus};
