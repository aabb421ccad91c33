//! # Domain Models
//!
//! This crate contains pure domain types with minimal dependencies (`serde`, `bitflags`, `thiserror`).
//! Keep it lean: no I/O, no networking, just data and small helpers.

pub mod blocks;
pub mod capabilities;
pub mod config;
pub mod constants;
pub mod events;
pub mod registry;
