//! # KanMind API Server Library
//!
//! HTTP layer of the KanMind task board backend.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with JSON error rejections
//! - `schemas`: Request validation and response shapes
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod schemas;
