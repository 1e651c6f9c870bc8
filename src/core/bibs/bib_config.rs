use std::path::PathBuf;

pub const DEFAULT_SHEET_NAME: &str = "Runners";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Setting {var} still holds the placeholder value '{value}'")]
    Unedited { var: &'static str, value: String },
    #[error("Invalid export policy '{0}' (expected 'strict' or 'lenient')")]
    InvalidExportPolicy(String),
}

/// How a PDF export response is judged before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPolicy {
    /// Only a successful `application/pdf` response is uploaded.
    #[default]
    Strict,
    /// Whatever body came back is uploaded as the PDF.
    Lenient,
}

impl ExportPolicy {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(ConfigError::InvalidExportPolicy(value.to_string())),
        }
    }
}

/// Everything one batch run needs to know about the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub template_id: String,
    pub output_folder_id: String,
    pub export_policy: ExportPolicy,
    pub report_path: Option<PathBuf>,
}

impl BibConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| -> Result<String, ConfigError> {
            let value = optional(key).ok_or(ConfigError::Missing(key))?;
            if is_unedited_placeholder(&value) {
                return Err(ConfigError::Unedited { var: key, value });
            }
            Ok(value)
        };

        let export_policy = match optional("BIB_EXPORT_POLICY") {
            Some(value) => ExportPolicy::parse(&value)?,
            None => ExportPolicy::default(),
        };

        Ok(Self {
            spreadsheet_id: required("ROSTER_SPREADSHEET_ID")?,
            sheet_name: optional("ROSTER_SHEET_NAME")
                .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            template_id: required("BIB_TEMPLATE_ID")?,
            output_folder_id: required("BIB_OUTPUT_FOLDER_ID")?,
            export_policy,
            report_path: optional("BIB_REPORT_PATH").map(PathBuf::from),
        })
    }
}

// Sample ids shipped in docs look like `XX_ID_FOLDER_XX`.
fn is_unedited_placeholder(value: &str) -> bool {
    value.len() > 4 && value.starts_with("XX_") && value.ends_with("_XX")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: [(&str, &str); 3] = [
        ("ROSTER_SPREADSHEET_ID", "sheet-1"),
        ("BIB_TEMPLATE_ID", "tpl-1"),
        ("BIB_OUTPUT_FOLDER_ID", "folder-1"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = BibConfig::from_lookup(lookup(&BASE)).unwrap();

        assert_eq!(config.sheet_name, DEFAULT_SHEET_NAME);
        assert_eq!(config.export_policy, ExportPolicy::Strict);
        assert_eq!(config.report_path, None);
        assert_eq!(config.template_id, "tpl-1");
    }

    #[test]
    fn test_optional_overrides() {
        let mut pairs = BASE.to_vec();
        pairs.push(("ROSTER_SHEET_NAME", "Corredores"));
        pairs.push(("BIB_EXPORT_POLICY", "Lenient"));
        pairs.push(("BIB_REPORT_PATH", "out/report.json"));

        let config = BibConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.sheet_name, "Corredores");
        assert_eq!(config.export_policy, ExportPolicy::Lenient);
        assert_eq!(config.report_path, Some(PathBuf::from("out/report.json")));
    }

    #[test]
    fn test_missing_and_blank_values_rejected() {
        let missing = BibConfig::from_lookup(lookup(&BASE[..2]));
        assert_eq!(missing, Err(ConfigError::Missing("BIB_OUTPUT_FOLDER_ID")));

        let mut blank = BASE.to_vec();
        blank[1] = ("BIB_TEMPLATE_ID", "   ");
        assert_eq!(
            BibConfig::from_lookup(lookup(&blank)),
            Err(ConfigError::Missing("BIB_TEMPLATE_ID"))
        );
    }

    #[test]
    fn test_unedited_placeholder_rejected() {
        let mut pairs = BASE.to_vec();
        pairs[1] = ("BIB_TEMPLATE_ID", "XX_INCLUYA_EL_ID_TEMPLATE_XX");

        let err = BibConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Unedited {
                var: "BIB_TEMPLATE_ID",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_export_policy() {
        let mut pairs = BASE.to_vec();
        pairs.push(("BIB_EXPORT_POLICY", "yolo"));

        assert_eq!(
            BibConfig::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidExportPolicy("yolo".to_string()))
        );
    }
}
