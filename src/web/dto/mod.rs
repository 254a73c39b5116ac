pub mod account;
pub mod admin;
pub mod classes;
pub mod courses;
pub mod exercises;
