// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    ConsoleOperator, check_start_url, expand_path, format_model_check, format_model_table,
};

// Re-export exploration entry points from sitewalk-core
pub use sitewalk_core::report::{format_link_list, generate_summary_report};
pub use sitewalk_core::{ExploreOptions, execute_exploration};
