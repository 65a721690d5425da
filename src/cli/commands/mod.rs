//! Command implementation modules

pub mod combine;
pub mod recommend;

pub use combine::run_combine_command;
pub use recommend::{apply_overrides, run_recommend_command};
