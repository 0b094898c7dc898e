//! Profile picture relay library.
//!
//! Resolves an Instagram account's profile picture through a chain of
//! retrieval methods, optionally re-hosts it on ImgBB, and serves the result
//! over a small web UI and JSON API.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod account;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod fs_utils;
pub mod http;
pub mod methods;
pub mod nifty;
pub mod resolver;
pub mod upload;
pub mod web;
