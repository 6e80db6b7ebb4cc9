//! Order service integration tests.

mod service;

#[cfg(feature = "http")]
mod http;
