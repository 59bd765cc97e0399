pub mod command;
pub mod fileformat;
pub mod threading;
pub mod utils;

pub use fileformat::run_dir::OutputKind;
pub use fileformat::run_dir::RunDir;
