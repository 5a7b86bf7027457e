use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetalabelError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Length mismatch: {left} has {left_len} entries, {right} has {right_len}")]
    LengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    #[error("Out-of-order index at position {position}: {previous} followed by {current}")]
    OutOfOrder {
        position: usize,
        previous: usize,
        current: usize,
    },

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] config::ConfigError),
}

impl MetalabelError {
    /// Fails with `LengthMismatch` unless both series have the same length.
    pub fn ensure_same_len(
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    ) -> Result<()> {
        if left_len != right_len {
            return Err(MetalabelError::LengthMismatch {
                left,
                left_len,
                right,
                right_len,
            });
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, MetalabelError>;
