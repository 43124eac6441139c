pub mod config_model;
pub mod summary_model;
