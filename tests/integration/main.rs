//! Integration tests

mod config_test;
mod pipeline_test;
mod scheduler_test;
