use super::bib_config::BibConfig;
use super::bib_generator::BibGenerator;
use super::bib_models::{BatchReport, BibRequest, RowOutcome, RunnerRecord};
use super::bib_store::{BibError, FileStore, PresentationEditor, RosterSource};
use super::row_mapper::map_row;

/// Walks the roster and generates one bib per runner with an assigned number.
pub struct BibService<R: RosterSource, P: PresentationEditor, F: FileStore> {
    roster: R,
    generator: BibGenerator<P, F>,
}

impl<R: RosterSource, P: PresentationEditor, F: FileStore> BibService<R, P, F> {
    pub fn new(roster: R, generator: BibGenerator<P, F>) -> Self {
        Self { roster, generator }
    }

    /// Runs one full pass. Only a roster load failure aborts the run;
    /// per-row failures end up in the report.
    pub async fn run_batch(&self, config: &BibConfig) -> Result<BatchReport, BibError> {
        let mut report = BatchReport::start();

        let mut rows = self.roster.load_roster(&config.sheet_name).await?.into_iter();
        let header = rows.next().unwrap_or_default();

        tracing::debug!(
            sheet = %config.sheet_name,
            columns = header.len(),
            "Roster loaded"
        );

        for (index, row) in rows.enumerate() {
            // Row 1 is the header.
            let row_number = index + 2;
            let record = map_row(&row, &header);
            let token = record.token().map(str::to_string);

            let outcome = match build_request(&record) {
                Ok(None) => RowOutcome::Skipped,
                Ok(Some(request)) => match self.generator.generate_bib(config, &request).await {
                    Ok(bib) => RowOutcome::Generated {
                        file_id: bib.file_id,
                        file_name: bib.file_name,
                    },
                    Err(e) => {
                        tracing::error!(row = row_number, token = %request.token, "Error: {}", e);
                        RowOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                },
                Err(e) => {
                    tracing::error!(row = row_number, "Error: {}", e);
                    RowOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            report.record(row_number, token, outcome);
        }

        report.finish();
        tracing::info!("Total Bibs Generados {}", report.generated_count());

        Ok(report)
    }
}

/// `Ok(None)` means no bib number has been assigned yet.
pub fn build_request(record: &RunnerRecord) -> Result<Option<BibRequest>, BibError> {
    let bib_number = record
        .bib_number()
        .ok_or(BibError::MissingField("bibnumber"))?;
    if bib_number.is_empty() {
        return Ok(None);
    }

    let token = record.token().ok_or(BibError::MissingField("token"))?;
    let name = record.name().ok_or(BibError::MissingField("name"))?;
    let distance = record.distance().ok_or(BibError::MissingField("distance"))?;

    Ok(Some(BibRequest {
        token: token.to_string(),
        name: name.to_uppercase(),
        distance: distance.to_string(),
        bib_number: bib_number.to_string(),
    }))
}
