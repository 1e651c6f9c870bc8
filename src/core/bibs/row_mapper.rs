use super::bib_models::RunnerRecord;

/// Turns a header label into a field name: lowercase, whitespace runs become `_`.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut in_whitespace = false;

    for c in label.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }

    out
}

/// Zips a data row with the header into a record.
/// Extra cells on either side are ignored.
pub fn map_row(row: &[String], header: &[String]) -> RunnerRecord {
    let mut record = RunnerRecord::new();
    for (label, value) in header.iter().zip(row) {
        record.insert(normalize_label(label), value.clone());
    }
    record
}
