pub mod config;
pub mod duck;
pub mod error;
pub mod fetch;
pub mod import;
pub mod process;
pub mod schema;
pub mod select;

pub use config::Config;
pub use duck::TableMaterializer;
pub use error::{ImportError, ImportResult};
pub use import::{run, ImportMode, ImportReport, RunOutcome};
