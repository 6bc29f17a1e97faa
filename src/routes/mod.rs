pub mod auth;
pub mod health;
pub mod licenses;
pub mod roles;
