pub mod cloud_provider;
pub mod console_form;
pub mod instance;
