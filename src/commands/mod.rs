pub mod file_commands;
pub mod host_commands;
pub mod preview_commands;
pub mod search_commands;
