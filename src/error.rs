use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransitionError {
    /// A raster or boundary resource is missing, unreadable or not single-band categorical.
    #[error("Input error for {path}: {reason}")]
    Input { path: String, reason: String },

    /// Clipping produced nothing, or two coordinate systems could not be reconciled.
    #[error("Geometry error for {resource}: {reason}")]
    Geometry { resource: String, reason: String },

    /// A normalisation hit a zero total.
    #[error("Numeric error: {0}")]
    Numeric(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransitionError {
    pub fn input(path: impl Into<String>, reason: impl ToString) -> Self {
        TransitionError::Input {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn geometry(resource: impl Into<String>, reason: impl ToString) -> Self {
        TransitionError::Geometry {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransitionError>;
