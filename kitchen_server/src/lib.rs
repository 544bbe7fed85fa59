//! # Kitchen server
//! This crate hosts the HTTP/JSON server for the cloud kitchen ordering back end. It is responsible for:
//! * Signing customers and admins in, and checking their access tokens on every request.
//! * Serving the menu, the guest and customer carts, checkout and the order history.
//! * Receiving proofs of payment and letting admins confirm or reject them.
//!
//! All business rules live in `kitchen_engine`. The handlers here only translate between HTTP and the engine APIs.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/auth/register` and `/auth/login`: Issue access tokens.
//! * `/api/...`: Everything else. Admin routes live under `/api/admin`, except payment confirmation and rejection.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
