pub mod cli;
pub mod config;
pub mod depict;
pub mod error;
pub mod export;
pub mod interactive;
pub mod loader;
pub mod rdkit;
pub mod report;
pub mod session;
