//! Utility functions for domain name normalization and validation.
//!
//! Normalization produces the store key: lowercase, IDNA 2008 (punycode)
//! ASCII form, no trailing dot. A name that fails normalization is rejected
//! before it can reach the store.

use crate::error::DirectoryError;

/// Normalize a raw domain name into its canonical store key.
///
/// Trims whitespace, strips a single trailing dot, converts
/// internationalised domain names (IDN) to ASCII via IDNA 2008, and
/// validates the resulting structure.
///
/// # Arguments
///
/// * `raw` - The domain name as it appeared in user input or an import row
///
/// # Returns
///
/// The normalized name, or `DirectoryError::InvalidDomain` with a reason.
pub fn normalize_domain(raw: &str) -> Result<String, DirectoryError> {
    let trimmed = raw.trim().trim_end_matches('.');

    if trimmed.is_empty() {
        return Err(DirectoryError::invalid_domain(
            raw,
            "Domain name cannot be empty",
        ));
    }

    // IDNA processing: converts Unicode labels to Punycode, lowercases,
    // and rejects forbidden characters.
    let ascii = idna::domain_to_ascii_strict(trimmed)
        .map_err(|_| DirectoryError::invalid_domain(raw, "Not a valid domain name"))?;

    if ascii.len() > 253 {
        return Err(DirectoryError::invalid_domain(
            raw,
            format!("Exceeds maximum length of 253 characters (got {})", ascii.len()),
        ));
    }

    if !is_valid_fqdn(&ascii) {
        return Err(DirectoryError::invalid_domain(
            raw,
            "Expected a fully qualified name like 'example.com'",
        ));
    }

    Ok(ascii)
}

/// Validate that an already-ASCII domain has basic FQDN structure.
fn is_valid_fqdn(domain: &str) -> bool {
    // Must contain at least one dot; this directory stores registrable
    // domains, not bare labels
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() < 2 {
        return false;
    }

    // Each label must be valid
    for part in parts {
        if part.is_empty() || part.len() > 63 {
            return false;
        }

        // Cannot start or end with hyphen
        if part.starts_with('-') || part.ends_with('-') {
            return false;
        }

        // Only alphanumeric and hyphens
        if !part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}
