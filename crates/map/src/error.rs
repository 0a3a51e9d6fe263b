use scene::ProjectionError;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    MissingProjection,
    MissingBounds,
    InvalidBounds { reason: String },
    InvalidPadding { reason: String },
    InvalidSize { width: f64, height: f64 },
    InvalidPixelRatio { value: f64 },
    InvalidZoom { min_zoom: f64, max_zoom: f64 },
    Json(String),
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::MissingProjection => write!(f, "map configuration has no projection"),
            ConfigurationError::MissingBounds => write!(f, "map configuration has no bounds"),
            ConfigurationError::InvalidBounds { reason } => write!(f, "invalid bounds: {reason}"),
            ConfigurationError::InvalidPadding { reason } => write!(f, "invalid padding: {reason}"),
            ConfigurationError::InvalidSize { width, height } => {
                write!(f, "invalid map size: width={width} height={height}")
            }
            ConfigurationError::InvalidPixelRatio { value } => {
                write!(f, "pixel ratio must be positive, got {value}")
            }
            ConfigurationError::InvalidZoom { min_zoom, max_zoom } => write!(
                f,
                "zoom bounds must satisfy 0 < min <= max, got min={min_zoom} max={max_zoom}"
            ),
            ConfigurationError::Json(e) => write!(f, "config json error: {e}"),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Anything that aborts building a map context.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    Configuration(ConfigurationError),
    InvalidGeometry(ProjectionError),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::Configuration(e) => write!(f, "{e}"),
            MapError::InvalidGeometry(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Configuration(e) => Some(e),
            MapError::InvalidGeometry(e) => Some(e),
        }
    }
}

impl From<ConfigurationError> for MapError {
    fn from(e: ConfigurationError) -> Self {
        MapError::Configuration(e)
    }
}

impl From<ProjectionError> for MapError {
    fn from(e: ProjectionError) -> Self {
        MapError::InvalidGeometry(e)
    }
}
