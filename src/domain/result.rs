//! Result type alias for the pipeline
//!
//! This module provides a convenient Result type alias that uses EmsError
//! as the error type.

use super::errors::EmsError;

/// Result type alias for pipeline operations
///
/// # Examples
///
/// ```
/// use ems_metrics::domain::result::Result;
/// use ems_metrics::domain::errors::EmsError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(EmsError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, EmsError>;
