//! Turnstile - Sliding-Window Admission Control
//!
//! This crate gates an HTTP service so that no more than a fixed number of
//! requests are admitted in any trailing one-second interval. The limiter
//! keeps a ring buffer of the most recent admission times, which gives an
//! exact trailing-window guarantee with constant memory.

pub mod config;
pub mod error;
pub mod http;
pub mod loadgen;
pub mod ratelimit;
