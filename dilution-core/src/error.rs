use thiserror::Error;

#[derive(Debug, Error)]
pub enum DilutionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Malformed {table} at {location}: {reason}")]
    MalformedInputTable {
        table: String,
        location: String,
        reason: String,
    },

    #[error("Arithmetic violation for drug '{drug}' at dose level {level}: {reason}")]
    ArithmeticViolation {
        drug: String,
        level: String,
        reason: String,
    },

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}

impl DilutionError {
    pub(crate) fn malformed(
        table: &str,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedInputTable {
            table: table.to_string(),
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn arithmetic(
        drug: &str,
        level: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::ArithmeticViolation {
            drug: drug.to_string(),
            level: level.to_string(),
            reason: reason.into(),
        }
    }
}
