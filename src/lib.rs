#![doc = "The `colorwish` library crate."]
#![doc = ""]
#![doc = "This crate contains the two ColorWish subsystems: the token-authenticated"]
#![doc = "user backend (authentication, domain models, routing, error handling) used"]
#![doc = "by the server binary (`main.rs`), and the batch coloring-book image"]
#![doc = "generator (`generator` module) used by the `generate` binary."]

pub mod auth;
pub mod config;
pub mod error;
pub mod generator;
pub mod models;
pub mod routes;
