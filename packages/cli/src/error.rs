use collision_map_analytics::AnalyticsError;
use collision_map_spatial::SpatialError;
use collision_map_store::StoreError;

/// Errors surfaced to the command line user.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("{0}")]
    Usage(String),
}
