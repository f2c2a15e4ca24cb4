//! The client library for the Me-Dot-U-Dot game service.
//!
//! Wraps the HTTP endpoints of the service, follows games through their
//! move streams, and drives the replay of finished or ongoing games.

mod error;
mod macros;

pub mod controller;
pub mod journal;
pub mod live;
pub mod render;
pub mod service;
pub mod setup;
pub mod stream;

pub use error::Error;
