use thiserror::Error;

/// Failure to decode a dataset document into a [`FeatureCollection`](crate::FeatureCollection).
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a FeatureCollection object, found {0}")]
    NotAnObject(&'static str),

    #[error("FeatureCollection has no `features` array")]
    MissingFeatures,
}

/// Failure to interpret an element's inline style or CSS transform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CssError {
    #[error("unsupported transform function `{0}`")]
    UnknownFunction(String),

    #[error("malformed transform list near `{0}`")]
    Malformed(String),

    #[error("`{function}` expects {expected} argument(s), got {got}")]
    ArgumentCount {
        function: String,
        expected: &'static str,
        got: usize,
    },

    #[error("invalid {kind} `{value}`")]
    InvalidValue { kind: &'static str, value: String },

    #[error("unsupported transform-origin `{0}` (only px lengths are supported)")]
    UnsupportedOrigin(String),

    #[error("surface backing buffer has zero width")]
    ZeroBackingWidth,
}

/// A query-string override that could not be applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
}
