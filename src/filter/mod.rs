//! Dependency filtering
//!
//! [`Predicate`] compiles the five predicate axes of the resolved options;
//! the pipeline functions apply it to a dependency list.

mod pipeline;
mod predicate;
mod spec;

pub use pipeline::{apply, select_dependencies, select_results};
pub use predicate::Predicate;
pub use spec::{split_entries, Matcher};

/// Filter errors
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid {axis}: {message}")]
    InvalidSpec { axis: String, message: String },

    #[error("{axis} callback failed for {subject}: {message}")]
    Callback {
        axis: String,
        subject: String,
        message: String,
    },
}
