//! Core trait abstractions.
//!
//! Applications implement these to plug in providers and HTTP transport.

pub mod fetcher;
pub mod harvester;
pub mod source;
