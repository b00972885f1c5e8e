//! Port traits through which the core talks to the outside world.

pub mod config_port;
pub mod data_port;
pub mod report_port;
