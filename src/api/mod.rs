pub mod codes;
pub mod models;
