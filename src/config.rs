use std::path::PathBuf;

use serde::Serialize;

use crate::error::{PipelineError, Result};

pub const DEFAULT_SOURCE_DIR: &str = "datos_excel";
pub const DEFAULT_SHEET_NAME: &str = "Hoja1";
pub const DEFAULT_PASS_THRESHOLD: f64 = 60.0;

/// Canonical names for the three positional identity columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityColumns {
    pub group: String,
    pub student_id: String,
    pub student_name: String,
}

impl Default for IdentityColumns {
    fn default() -> Self {
        Self {
            group: "grupo".to_string(),
            student_id: "matricula".to_string(),
            student_name: "nombre".to_string(),
        }
    }
}

impl IdentityColumns {
    /// The three names in column order.
    pub fn names(&self) -> [&str; 3] {
        [
            self.group.as_str(),
            self.student_id.as_str(),
            self.student_name.as_str(),
        ]
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub source_dir: PathBuf,
    pub sheet_name: String,
    pub pass_threshold: f64,
    pub identity_columns: IdentityColumns,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            identity_columns: IdentityColumns::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads the config from `GRADES_DIR`, `GRADES_SHEET` and `PASS_THRESHOLD`,
    /// reading a `.env` file first if one exists. Unset values keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(dir) = std::env::var("GRADES_DIR") {
            config.source_dir = PathBuf::from(dir);
        }
        if let Ok(sheet) = std::env::var("GRADES_SHEET") {
            config.sheet_name = sheet;
        }
        if let Ok(raw) = std::env::var("PASS_THRESHOLD") {
            config.pass_threshold = parse_threshold(&raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.pass_threshold.is_finite() {
            return Err(PipelineError::Config(format!(
                "pass threshold must be finite, got {}",
                self.pass_threshold
            )));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(PipelineError::Config("sheet name is empty".to_string()));
        }
        Ok(())
    }
}

pub fn parse_threshold(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PipelineError::Config(format!("invalid pass threshold: {raw:?}")))?;
    if !value.is_finite() {
        return Err(PipelineError::Config(format!(
            "pass threshold must be finite, got {raw:?}"
        )));
    }
    Ok(value)
}
