pub mod admin;
pub mod demo;
pub mod tokens;
