#![deny(missing_docs)]
//! Telegram bot that collects photos and videos sent in a burst and posts
//! them back as albums.

/// Media queue, debounce, pagination and dispatch of albums
pub mod album;
/// Telegram transport: dispatcher tree, handlers and outbound messaging
pub mod bot;
/// Configuration and settings management
pub mod config;
/// Localized message lookup
pub mod i18n;
/// Per-user session persistence
pub mod storage;
/// Shared helpers
pub mod utils;
/// Static landing page
pub mod web;
