pub mod console;

pub use console::{ConsoleReporter, Line, Stream};
