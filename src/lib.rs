// Kotonami: live keyword trends from Japanese social-media posts.
//
// This is the library root. Records flow source → ingest → lexicon →
// ranking → broadcast; the web server (feature "web") serves the results.

pub mod broadcast;
pub mod config;
pub mod ingest;
pub mod lexicon;
pub mod output;
pub mod ranking;
pub mod source;

#[cfg(feature = "web")]
pub mod web;
