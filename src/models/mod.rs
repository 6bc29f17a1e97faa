pub mod license;
pub mod role;
pub mod user;
