pub mod backend;
pub mod cli;
pub mod config;
pub mod console;
pub mod diagnosis;
pub mod error;
pub mod events;
pub mod filter;
pub mod interrupt;
pub mod probe;
pub mod session;

pub use backend::*;
pub use config::ProbeConfig;
pub use console::Console;
pub use diagnosis::Diagnosis;
pub use error::{ProbeError, Result};
pub use events::*;
pub use filter::*;
pub use interrupt::*;
pub use probe::*;
pub use session::*;
