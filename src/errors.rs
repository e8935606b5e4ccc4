//! Centralized error handling for RuSeFo
//!
//! This module provides structured error types covering file I/O, missing
//! coordinates and variables, unit contract violations, and time-axis
//! decoding, enabling better error context and type safety.

use std::fmt;

/// Main error type for RuSeFo operations
#[derive(Debug)]
pub enum ProcessError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Required coordinate absent from an input file
    MissingCoordinate { name: String },

    /// Required variable absent from an input file
    MissingVariable { var: String },

    /// Fewer than two time steps, differencing is undefined
    InsufficientTimeSteps { var: String, steps: usize },

    /// A variable's units attribute does not match the stage's entry contract
    UnitMismatch {
        var: String,
        expected: String,
        found: String,
    },

    /// Unsupported or malformed CF time encoding
    TimeDecode(String),

    /// Generic error for everything else
    Generic(String),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            ProcessError::IoError(e) => write!(f, "I/O error: {}", e),
            ProcessError::ArrayError(e) => write!(f, "Array error: {}", e),
            ProcessError::MissingCoordinate { name } => {
                write!(f, "Coordinate '{}' not found in file", name)
            }
            ProcessError::MissingVariable { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            ProcessError::InsufficientTimeSteps { var, steps } => write!(
                f,
                "Variable '{}' has {} time step(s); at least 2 are required for differencing",
                var, steps
            ),
            ProcessError::UnitMismatch {
                var,
                expected,
                found,
            } => write!(
                f,
                "Variable '{}' has units '{}', expected '{}'",
                var, found, expected
            ),
            ProcessError::TimeDecode(msg) => write!(f, "Time decoding error: {}", msg),
            ProcessError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::NetCDFError(e) => Some(e),
            ProcessError::IoError(e) => Some(e),
            ProcessError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for ProcessError {
    fn from(error: netcdf::Error) -> Self {
        ProcessError::NetCDFError(error)
    }
}

impl From<std::io::Error> for ProcessError {
    fn from(error: std::io::Error) -> Self {
        ProcessError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for ProcessError {
    fn from(error: ndarray::ShapeError) -> Self {
        ProcessError::ArrayError(error)
    }
}

impl From<String> for ProcessError {
    fn from(error: String) -> Self {
        ProcessError::Generic(error)
    }
}

impl From<&str> for ProcessError {
    fn from(error: &str) -> Self {
        ProcessError::Generic(error.to_string())
    }
}

/// Result type alias for RuSeFo operations
pub type Result<T> = std::result::Result<T, ProcessError>;
