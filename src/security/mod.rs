//! Security module
//!
//! Provides API key storage (environment, OS keyring, private file) and
//! request input validation.

pub mod keyring;
pub mod validation;

use anyhow::Result;

pub use validation::{validate_history, validate_input, validate_system_prompt, Limits};

/// Set API key in secure keyring
pub fn set_api_key(key: &str) -> Result<()> {
    keyring::set_api_key(key)
}

/// Get API key from the environment or secure storage
pub fn get_api_key() -> Result<String> {
    keyring::get_api_key()
}

/// Delete API key from keyring
pub fn delete_api_key() -> Result<()> {
    keyring::delete_api_key()
}
