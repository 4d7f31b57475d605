//! # modeladmin-test
//!
//! Test utilities for modeladmin. [`client::TestClient`] drives an axum
//! [`Router`](axum::Router) in-process, without binding a socket.

pub mod client;

pub use client::{TestClient, TestResponse};
