//! Phone number normalization.
//!
//! Recipient numbers arrive however the customer record stored them —
//! "98765 43210", "+91-98765-43210", etc. The provider wants a bare
//! international address. Numbers without an explicit `+` prefix get the
//! configured default country code.

use crate::error::DeliveryError;

/// Normalize `raw` to an international-format address like `+919876543210`.
///
/// `default_country_code` must carry its own `+` (e.g. `"+91"`); it comes
/// straight from `whatsapp.default_country_code` in the config.
pub fn normalize(raw: &str, default_country_code: &str) -> Result<String, DeliveryError> {
    let mut has_plus = false;
    let mut digits = String::with_capacity(raw.len());

    for (i, ch) in raw.trim().chars().enumerate() {
        match ch {
            '+' if i == 0 => has_plus = true,
            '0'..='9' => digits.push(ch),
            ' ' | '-' | '(' | ')' | '.' => {}
            other => {
                return Err(DeliveryError::InvalidRecipient(format!(
                    "unexpected character {other:?} in phone number"
                )))
            }
        }
    }

    if digits.is_empty() {
        return Err(DeliveryError::InvalidRecipient("empty phone number".into()));
    }

    let full = if has_plus {
        format!("+{digits}")
    } else {
        format!("{default_country_code}{digits}")
    };

    // E.164 allows at most 15 digits; anything shorter than 8 total is junk.
    let total_digits = full.chars().filter(|c| c.is_ascii_digit()).count();
    if !(8..=15).contains(&total_digits) {
        return Err(DeliveryError::InvalidRecipient(format!(
            "{total_digits} digits is outside the valid range"
        )));
    }

    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_gets_default_country_code() {
        assert_eq!(normalize("9876543210", "+91").unwrap(), "+919876543210");
    }

    #[test]
    fn explicit_plus_is_kept_as_is() {
        assert_eq!(normalize("+14155238886", "+91").unwrap(), "+14155238886");
    }

    #[test]
    fn separators_are_stripped() {
        assert_eq!(
            normalize("+91 (98765) 432-10", "+91").unwrap(),
            "+919876543210"
        );
    }

    #[test]
    fn empty_and_junk_are_rejected() {
        assert!(normalize("", "+91").is_err());
        assert!(normalize("   ", "+91").is_err());
        assert!(normalize("98765abc", "+91").is_err());
    }

    #[test]
    fn length_bounds_are_enforced() {
        assert!(normalize("12345", "+91").is_err());
        assert!(normalize("12345678901234567890", "+91").is_err());
    }
}
