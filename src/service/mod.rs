pub mod access;
pub mod admin;
pub mod auth;
pub mod calendar;
pub mod club;
pub mod crypto;
pub mod event;
pub mod interest;
pub mod log;
pub mod resource;
pub mod user;
