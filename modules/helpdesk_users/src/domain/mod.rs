pub mod error;
pub mod outcome;
pub mod ports;
pub mod service;
