pub mod args;
pub mod options;
pub mod probe;
