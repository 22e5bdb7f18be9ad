pub mod errors;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod roles;
pub mod service;
pub mod store;
pub mod sweeper;
