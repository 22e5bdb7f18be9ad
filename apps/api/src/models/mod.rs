pub mod message;
pub mod portfolio;
pub mod token;
pub mod user;
