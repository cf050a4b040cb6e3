pub mod backend;
pub mod cli;
pub mod config;
pub mod importer;
pub mod models;
pub mod server;
pub mod service;
pub mod storage;
