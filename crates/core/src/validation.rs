//! Request input validation.
//!
//! Runs before any pipeline stage, so a rejected request never touches a provider.

use crate::bar::Interval;
use crate::error::ValidationError;

/// Longest accepted symbol.
pub const MAX_SYMBOL_LEN: usize = 20;

/// Characters allowed besides ASCII alphanumerics (`BBCA.JK`, `BRK-B`, `^GSPC`, `EURUSD=X`).
const SYMBOL_PUNCTUATION: [char; 5] = ['.', '-', '^', '=', '_'];

/// A validated prediction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    pub symbol: String,
    pub interval: Interval,
}

/// Trims and upper-cases a symbol, rejecting anything that could not be a ticker.
///
/// # Errors
/// Returns [`ValidationError::EmptySymbol`] for blank input and
/// [`ValidationError::InvalidSymbol`] for over-long input or forbidden characters.
pub fn validate_symbol(symbol: &str) -> Result<String, ValidationError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }

    if trimmed.len() > MAX_SYMBOL_LEN {
        return Err(ValidationError::invalid_symbol(
            trimmed,
            format!("exceeds maximum length of {MAX_SYMBOL_LEN}"),
        ));
    }

    if trimmed.contains("..") {
        return Err(ValidationError::invalid_symbol(trimmed, "contains '..'"));
    }

    if let Some(bad) = trimmed
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !SYMBOL_PUNCTUATION.contains(c))
    {
        return Err(ValidationError::invalid_symbol(
            trimmed,
            format!("character '{bad}' is not allowed"),
        ));
    }

    Ok(trimmed.to_ascii_uppercase())
}

/// Validates both request fields.
///
/// # Errors
/// Returns the first [`ValidationError`] found, symbol first.
pub fn validate_request(symbol: &str, interval: &str) -> Result<PredictionRequest, ValidationError> {
    let symbol = validate_symbol(symbol)?;
    let interval = interval.parse::<Interval>()?;
    Ok(PredictionRequest { symbol, interval })
}
