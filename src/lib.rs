pub mod adapters;
pub mod cli;
pub mod config;
pub mod content_item;
pub mod dispatch;
pub mod launch;
pub mod logging;
pub mod ports;
pub mod predicates;
pub mod server;
