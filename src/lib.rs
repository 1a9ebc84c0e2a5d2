pub mod app;
pub mod config;
pub mod orchestration;
pub mod persistence;
pub mod provider;
pub mod shared;
