pub mod api;
pub mod catalog;
pub mod envelope;
pub mod models;
pub mod validation;
