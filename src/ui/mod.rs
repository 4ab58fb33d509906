//! Terminal user interface.

pub mod app;
pub mod dashboard;
pub mod prompt;
pub mod tasks;
pub mod viewer;

pub use app::App;
