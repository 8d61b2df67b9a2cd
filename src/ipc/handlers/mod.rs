pub mod auth;
pub mod core;
pub mod records;
pub mod students;
