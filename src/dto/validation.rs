//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::suit::Suit;

/// Longest accepted display name, in characters.
pub const DISPLAY_NAME_MAX_CHARS: usize = 50;

/// Validates that a symbol is one of ♠ ♥ ♦ ♣ (or its English name).
///
/// # Examples
///
/// ```ignore
/// validate_symbol("♥")      // Ok
/// validate_symbol("spades") // Ok
/// validate_symbol("★")      // Err
/// ```
pub fn validate_symbol(symbol: &str) -> Result<(), ValidationError> {
    if symbol.parse::<Suit>().is_err() {
        let mut err = ValidationError::new("symbol");
        err.message = Some(format!("Symbol must be one of ♠ ♥ ♦ ♣ (got {symbol:?})").into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a display name is non-blank and at most
/// [`DISPLAY_NAME_MAX_CHARS`] characters once trimmed.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("display_name_empty");
        err.message = Some("Display name must not be blank".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > DISPLAY_NAME_MAX_CHARS {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("Display name must be at most {DISPLAY_NAME_MAX_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}
