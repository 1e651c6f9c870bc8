pub mod bib_config;
pub mod bib_generator;
pub mod bib_models;
pub mod bib_service;
pub mod bib_store;
pub mod row_mapper;

#[cfg(test)]
pub(crate) mod test_support;

pub use bib_config::BibConfig;
pub use bib_generator::BibGenerator;
pub use bib_models::BatchReport;
pub use bib_service::BibService;
pub use bib_store::{BibError, FileStore, PresentationEditor, RosterSource};
