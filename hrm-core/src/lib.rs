//! HRM core library
//!
//! Local-first storage for employees, daily cader reports and audit
//! entries, with a best-effort mirror to a cloud document store.

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod sync;
