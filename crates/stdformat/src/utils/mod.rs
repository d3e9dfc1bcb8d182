mod exec;
mod logger;
mod stdin_reader;

pub use exec::*;
pub use logger::*;
pub use stdin_reader::*;
