//! Pallet layout engine for a single trailer.
//!
//! The core ([`packing`], [`unit`], [`fleet`], [`interaction`]) is synchronous and free
//! of I/O. [`session`] runs it as a single-writer task and [`api`] exposes it over HTTP.

pub mod api;
pub mod config;
pub mod controls;
pub mod fleet;
pub mod geometry;
pub mod interaction;
pub mod model;
pub mod packing;
pub mod session;
pub mod snapshot;
pub mod types;
pub mod unit;
