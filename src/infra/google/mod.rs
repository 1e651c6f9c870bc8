// =============================================================================
// GOOGLE WORKSPACE MODULE
// =============================================================================
//
// HTTP implementations of the core bib traits:
// - `sheets_client.rs` reads the roster (`RosterSource`)
// - `slides_client.rs` fills in template copies (`PresentationEditor`)
// - `drive_client.rs` copies, exports, uploads, shares and deletes (`FileStore`)
// - `auth.rs` supplies bearer tokens to all three
//
// The clients share one `reqwest::Client` and one token provider, so a token
// fetched for the roster read is reused for every bib in the run.

pub mod auth;
pub mod drive_client;
pub mod sheets_client;
pub mod slides_client;

pub use auth::token_provider_from_env;
pub use drive_client::GoogleDriveClient;
pub use sheets_client::GoogleSheetsClient;
pub use slides_client::GoogleSlidesClient;
