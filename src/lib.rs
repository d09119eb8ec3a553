//! Loca: a community marketplace API for products, jobs and service requests.
//!
//! [`schema`] holds the record types and validation rules; clients can depend
//! on this crate for them. The rest is the HTTP server.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod listings;
pub mod schema;
pub mod seed;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;
