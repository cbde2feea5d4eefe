#![doc = "The `taskward` library crate."]
#![doc = ""]
#![doc = "This crate contains the business logic, domain models, authentication"]
#![doc = "mechanisms, outbound mail, routing configuration, and error handling for"]
#![doc = "the Taskward backend. It is used by the main binary (`main.rs`) to"]
#![doc = "construct and run the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod routes;
