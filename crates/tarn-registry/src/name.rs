//! Package name validation.
//!
//! Names end up both in registry URLs and as directory names under the
//! dependency store, so anything that could escape the store is rejected.

use crate::error::{RegistryError, Result};

/// Longest name the public registry accepts.
pub const MAX_NAME_LEN: usize = 214;

/// Check that `name` is a usable package name.
///
/// Accepts plain names (`left-pad`) and scoped names (`@types/node`).
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return invalid("name cannot be empty");
    }
    if name.len() > MAX_NAME_LEN {
        return invalid("name is longer than 214 characters");
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control() || c == '\\') {
        return invalid("name contains whitespace or a backslash");
    }

    let segments: Vec<&str> = name.split('/').collect();
    match segments.as_slice() {
        [plain] => check_segment(plain).map_or(Ok(()), invalid),
        [scope, package] => {
            let Some(scope_name) = scope.strip_prefix('@') else {
                return invalid("only scoped names (@scope/name) may contain '/'");
            };
            if let Some(reason) = check_segment(scope_name).or_else(|| check_segment(package)) {
                return invalid(reason);
            }
            Ok(())
        }
        _ => invalid("name contains more than one '/'"),
    }
}

/// Whether `name` is a scoped (`@scope/name`) package.
pub fn is_scoped(name: &str) -> bool {
    name.starts_with('@') && name.contains('/')
}

/// Path segment used to request `name` from a registry.
///
/// Scoped names keep the `@` but have their `/` escaped.
pub fn registry_path(name: &str) -> String {
    name.replace('/', "%2f")
}

fn check_segment(segment: &str) -> Option<&'static str> {
    if segment.is_empty() {
        Some("name has an empty segment")
    } else if segment.starts_with('.') {
        Some("name cannot start with '.'")
    } else if segment.starts_with('_') {
        Some("name cannot start with '_'")
    } else {
        None
    }
}
