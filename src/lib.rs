pub mod config;
pub mod error;
pub mod kernel;
pub mod memory;
pub mod monitor;
pub mod services;

pub use config::GuardianConfig;
pub use monitor::GuardianMonitor;
