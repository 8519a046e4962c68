//! Database layer: schema initialization and models

pub mod init;
pub mod models;

pub use init::init_database;
