pub mod console_handler;
pub mod handler;
