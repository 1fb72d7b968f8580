//! Error types for streaming and configuration.
//!
//! Every [`StreamError`] is a caller or bookkeeping bug rather than a runtime
//! condition; height generation itself cannot fail.

use std::error::Error;
use std::{fmt, io};

use crate::coords::{GridCoord, WorldPos};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Error raised by chunk streaming operations.
#[derive(Debug)]
pub enum StreamError {
  /// A chunk was inserted for a coordinate that is already resident.
  DuplicateCoord(GridCoord),
  /// A coordinate was looked up or evicted but is not resident.
  NotResident(GridCoord),
  /// `advance` was called before `initialize`.
  NotInitialized,
  /// A window centered here would leave the i32 chunk grid.
  WindowOutOfRange(GridCoord),
  /// A viewer position is not finite or maps outside the i32 chunk grid.
  PositionOutOfRange(WorldPos),
  /// Slot or coordinate bookkeeping disagrees with itself.
  InvariantViolation(String),
  /// The streaming configuration was rejected.
  Config(ConfigError),
}

impl StreamError {
  pub(crate) fn invariant(msg: impl Into<String>) -> Self {
    Self::InvariantViolation(msg.into())
  }
}

impl fmt::Display for StreamError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::DuplicateCoord(c) => write!(f, "chunk {c} is already resident"),
      Self::NotResident(c) => write!(f, "chunk {c} is not resident"),
      Self::NotInitialized => write!(f, "chunk manager is not initialized"),
      Self::WindowOutOfRange(c) => write!(f, "window centered at {c} leaves the chunk grid"),
      Self::PositionOutOfRange(p) => {
        write!(f, "viewer position ({}, {}) is outside the chunk grid", p.x, p.z)
      }
      Self::InvariantViolation(msg) => write!(f, "streaming invariant violated: {msg}"),
      Self::Config(e) => write!(f, "invalid configuration: {e}"),
    }
  }
}

impl Error for StreamError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      Self::Config(e) => Some(e),
      _ => None,
    }
  }
}

impl From<ConfigError> for StreamError {
  fn from(err: ConfigError) -> Self {
    Self::Config(err)
  }
}

/// Error loading or validating a [`StreamingConfig`](crate::StreamingConfig).
#[derive(Debug)]
pub enum ConfigError {
  /// Reading the config file failed.
  Io(io::Error),
  /// The file is not valid TOML for the config schema.
  Parse(toml::de::Error),
  /// A field holds a value the streamer cannot work with.
  Invalid(String),
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io(e) => write!(f, "I/O error: {e}"),
      Self::Parse(e) => write!(f, "parse error: {e}"),
      Self::Invalid(msg) => write!(f, "{msg}"),
    }
  }
}

impl Error for ConfigError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      Self::Io(e) => Some(e),
      Self::Parse(e) => Some(e),
      Self::Invalid(_) => None,
    }
  }
}

impl From<io::Error> for ConfigError {
  fn from(err: io::Error) -> Self {
    Self::Io(err)
  }
}

impl From<toml::de::Error> for ConfigError {
  fn from(err: toml::de::Error) -> Self {
    Self::Parse(err)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_names_the_coordinate() {
    let err = StreamError::NotResident(GridCoord::new(3, -2));
    assert_eq!(err.to_string(), "chunk (3, -2) is not resident");
  }

  #[test]
  fn config_error_is_exposed_as_source() {
    let err = StreamError::from(ConfigError::Invalid("chunk_size must be > 0".into()));
    assert!(err.source().is_some());
    assert!(err.to_string().contains("chunk_size"));
  }
}
