pub mod file_service;
pub mod import_service;
pub mod ocr_service;
pub mod preview_service;
pub mod region_service;
pub mod search_service;
