//! Application orchestration module

pub mod initialization;
pub mod execution;
pub mod repository;

pub use repository::{
    collect_histories, default_output_path, ensure_distinct, resolve_clones_dir, CollectedHistory,
    HistoryCollection,
};
pub use initialization::{load_configuration, configure_logging};
pub use execution::run_command;
