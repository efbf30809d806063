//! ThreatStream - a security news dashboard controller
//!
//! Pulls articles from a feed backend, classifies them by severity with
//! keyword tables, and serves filtered views, an hourly timeline and
//! cached AI summaries as JSON.

pub mod cache;
pub mod classifier;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod models;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod time_ago;
pub mod timeline;
