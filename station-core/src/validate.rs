//! City-name input filter for interactive use.
//!
//! This is a UX check, not an injection guard: storage always binds values as
//! query parameters.

use log::warn;

use crate::error::ValidationError;

pub const MAX_CITY_NAME_LEN: usize = 50;

const POLISH_LETTERS: &str = "ĄĆĘŁŃÓŚŻŹąćęłńóśżź";

/// Checks the rules in order; the first failing rule is reported.
pub fn validate_city_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    if !name.chars().all(is_allowed_char) {
        return Err(ValidationError::InvalidCharacters);
    }

    let len = name.chars().count();
    if len > MAX_CITY_NAME_LEN {
        return Err(ValidationError::TooLong { len, max: MAX_CITY_NAME_LEN });
    }

    Ok(())
}

pub fn is_valid_city_name(name: &str) -> bool {
    match validate_city_name(name) {
        Ok(()) => true,
        Err(err) => {
            warn!("rejected city name {name:?}: {err}");
            false
        }
    }
}

/// Trim, lowercase, then capitalize the first letter: `"  wROCŁAW "` -> `"Wrocław"`.
pub fn normalize_city_name(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == ' ' || POLISH_LETTERS.contains(c)
}
