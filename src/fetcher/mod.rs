// src/fetcher/mod.rs
// =============================================================================
// This module contains the fetch-and-extract logic.
//
// Submodules:
// - http: Downloads a page with reqwest and reports typed failures
// - html: Extracts the <title> text from an HTML body
// =============================================================================

mod html;
mod http;

pub use http::{FetchError, FetcherConfig, HttpFetcher, TitleFetcher};
