pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod transform;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::{EtlConfig, SourceFiles};
pub use error::{DropReason, RowError, StoreError};
pub use report::{FileStats, ReportFormat, RunReport};
pub use ui::{LogUi, Phase, SilentUi, Ui, UiApp};
