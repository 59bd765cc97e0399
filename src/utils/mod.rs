mod command_to_string;
mod detect_software;
mod exec;

pub use command_to_string::command_to_string;
pub use detect_software::check_tool;
pub use detect_software::warn_if_tool_missing;
pub use exec::run_logged;
pub use exec::run_logged_to_file;
