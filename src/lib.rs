pub mod capture;
pub mod comparison;
pub mod config;
pub mod image_loader;
pub mod layout;
pub mod session;
