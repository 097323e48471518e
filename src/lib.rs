// src/lib.rs

pub mod analyze;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod lfs;
pub mod model;
pub mod replay;
pub mod report;
pub mod scan;
pub mod transform;
