//! Multilingual tour storefront.
//!
//! Locale-prefixed storefront pages (`/en`, `/th`, `/zh`) backed by a tour
//! catalog whose text columns carry per-locale variants, UI dictionaries with
//! a fixed fallback chain, and an admin API that machine-translates content
//! on write. Prices are shown in a visitor-selected currency.

pub mod catalog;
pub mod config;
pub mod currency;
pub mod i18n;
pub mod middleware;
pub mod retry;
pub mod search;
pub mod security;
pub mod server;
pub mod storefront;
pub mod translation;
