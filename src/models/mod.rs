pub mod file_record;
pub mod search;
pub mod selection;
