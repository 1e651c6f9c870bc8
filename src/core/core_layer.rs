// The core module contains all business logic.
// It knows nothing about HTTP; the Google services are reached through
// the traits in `bibs/bib_store.rs`.

#[path = "bibs/mod.rs"]
pub mod bibs;
