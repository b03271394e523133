pub mod auth;
pub mod generate;
pub mod plans;
pub mod spotify;
