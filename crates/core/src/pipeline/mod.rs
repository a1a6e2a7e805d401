pub mod analysis_scheduler;
pub mod result_store;
pub mod scheduler_config;
