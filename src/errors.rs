//! Unified application error type.
//! Core components, the SQLite store and the CLI all return AppError so a
//! caller can decide locally how to surface a failure.

use crate::models::position::PositionError;
use crate::models::record::ReviewStatus;
use crate::models::record_type::RecordType;
use chrono::NaiveDateTime;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid coordinate: {0} (expected \"lat,lon\")")]
    InvalidCoordinate(String),

    #[error("Invalid record type: {0}")]
    InvalidRecordType(String),

    #[error("Invalid review status: {0}")]
    InvalidReviewStatus(String),

    #[error("Invalid day of week: {0}")]
    InvalidWeekday(String),

    // ---------------------------
    // Zone registry
    // ---------------------------
    #[error("Invalid zone: {0}")]
    InvalidZone(String),

    #[error("Zone {0} not found")]
    ZoneNotFound(i64),

    // ---------------------------
    // Attendance
    // ---------------------------
    #[error("No active zone found for this position")]
    NoZoneFound,

    #[error("Record type '{record_type}' is not allowed in zone '{zone}'")]
    RecordTypeNotAllowed { record_type: RecordType, zone: String },

    #[error("{at} is outside the working hours of zone '{zone}'")]
    OutsideWorkingHours { zone: String, at: NaiveDateTime },

    #[error("Attendance record {0} not found")]
    RecordNotFound(i64),

    #[error("Cannot change review status from '{from}' to '{to}'")]
    InvalidReviewTransition { from: ReviewStatus, to: ReviewStatus },

    // ---------------------------
    // Position tracking
    // ---------------------------
    #[error("Position unavailable: {0}")]
    PositionUnavailable(PositionError),

    #[error("Invalid position sample: {0}")]
    InvalidSample(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

/// Coarse classification used by callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input; fix it and try again.
    Input,
    /// An external resource failed; the caller decides whether to retry.
    Resource,
    Internal,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::InvalidDate(_)
            | AppError::InvalidTime(_)
            | AppError::InvalidCoordinate(_)
            | AppError::InvalidRecordType(_)
            | AppError::InvalidReviewStatus(_)
            | AppError::InvalidWeekday(_)
            | AppError::InvalidZone(_)
            | AppError::ZoneNotFound(_)
            | AppError::NoZoneFound
            | AppError::RecordTypeNotAllowed { .. }
            | AppError::OutsideWorkingHours { .. }
            | AppError::RecordNotFound(_)
            | AppError::InvalidReviewTransition { .. }
            | AppError::InvalidSample(_) => ErrorCategory::Input,

            AppError::Io(_)
            | AppError::Db(_)
            | AppError::PositionUnavailable(_)
            | AppError::Config(_)
            | AppError::ConfigParse(_)
            | AppError::Json(_)
            | AppError::Csv(_)
            | AppError::Export(_) => ErrorCategory::Resource,

            AppError::Migration(_) | AppError::Other(_) => ErrorCategory::Internal,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
