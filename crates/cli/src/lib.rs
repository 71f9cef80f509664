pub mod cli;
pub mod error;
pub mod logging;
pub mod report;
pub mod signals;

pub use error::Error;
