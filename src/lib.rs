pub mod bootstrap;
pub mod cluster;
pub mod config;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod platform;
pub mod services;
pub mod terminator;

pub use cluster::Cluster;
pub use error::ClusterError;
