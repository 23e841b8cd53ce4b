//! Verdant Core - Shared domain types.
//!
//! This crate provides the types shared by every Verdant component:
//! - `storefront` - Public storefront, order intake, and reporting API
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The hardiness classifier lives here so that the
//! product listing and any badge-rendering client label plants identically.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, and statuses
//! - [`hardiness`] - Cold-resistance bucketing of minimum temperatures

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod hardiness;
pub mod types;

pub use hardiness::ColdResistance;
pub use types::*;
