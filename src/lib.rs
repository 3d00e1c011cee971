pub mod config;
pub mod indicators;
pub mod output;
pub mod parser;
pub mod population;
pub mod records;
