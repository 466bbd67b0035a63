use thiserror::Error;

/// The input bytes could not be read as a table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file is empty or has no header row")]
    Empty,

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: expected {expected} fields, found {found}")]
    Ragged {
        line: u64,
        expected: usize,
        found: usize,
    },
}

/// The request does not fit the table or the chart kind.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("column not found: {0}")]
    UnknownColumn(String),

    #[error("unsupported chart type: '{0}'")]
    UnsupportedChart(String),

    #[error("a pie chart needs exactly one column")]
    PieNeedsSingleColumn,

    #[error("no rows left to plot")]
    NoData,
}

/// Main library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not read the file as CSV: {0}")]
    Load(#[from] LoadError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{feature} is not implemented")]
    Unimplemented { feature: String },

    #[error("rendering failed: {0}")]
    Render(String),
}

impl Error {
    pub fn unimplemented(feature: impl Into<String>) -> Self {
        Error::Unimplemented {
            feature: feature.into(),
        }
    }

    /// HTTP-equivalent status for the serving layer
    pub fn status(&self) -> u16 {
        match self {
            Error::Load(_) | Error::Validation(_) => 400,
            Error::Unimplemented { .. } => 501,
            Error::Render(_) => 500,
        }
    }

    /// Error body in the shape the front end expects
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::from(LoadError::Empty).status(), 400);
        assert_eq!(
            Error::from(ValidationError::UnknownColumn("x".into())).status(),
            400
        );
        assert_eq!(Error::unimplemented("grouping").status(), 501);
        assert_eq!(Error::Render("boom".into()).status(), 500);
    }

    #[test]
    fn test_validation_message_names_column() {
        let err = Error::from(ValidationError::UnknownColumn("price".into()));
        assert_eq!(err.to_string(), "column not found: price");
        assert_eq!(err.to_json()["error"], "column not found: price");
    }
}
