//! Input rules shared by the account, settings and links handlers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use url::Url;
use utoipa::ToSchema;

use crate::config::PasswordConfig;
use crate::errors::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));
static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("colour regex is valid"));

/// Loose email shape check: something@something.something, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// `#rrggbb`
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value)
}

/// Absolute http(s) URL
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

pub fn require_email(email: &str) -> Result<(), Error> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(Error::BadRequest {
            message: "Please enter a valid email address".to_string(),
        })
    }
}

/// One line of the password strength report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PasswordCheck {
    pub label: String,
    pub valid: bool,
}

/// Which strength rules a candidate password satisfies.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PasswordStrength {
    /// Number of passing checks
    pub score: usize,
    pub checks: Vec<PasswordCheck>,
}

impl PasswordStrength {
    pub fn is_acceptable(&self) -> bool {
        self.checks.iter().all(|c| c.valid)
    }
}

pub fn password_strength(password: &str, min_length: usize) -> PasswordStrength {
    let checks = vec![
        PasswordCheck {
            label: format!("At least {min_length} characters"),
            valid: password.chars().count() >= min_length,
        },
        PasswordCheck {
            label: "Uppercase letter".to_string(),
            valid: password.chars().any(|c| c.is_ascii_uppercase()),
        },
        PasswordCheck {
            label: "Lowercase letter".to_string(),
            valid: password.chars().any(|c| c.is_ascii_lowercase()),
        },
        PasswordCheck {
            label: "Number".to_string(),
            valid: password.chars().any(|c| c.is_ascii_digit()),
        },
    ];
    let score = checks.iter().filter(|c| c.valid).count();
    PasswordStrength { score, checks }
}

/// Reject passwords that fail any strength check or exceed the configured maximum length
pub fn validate_password(password: &str, config: &PasswordConfig) -> Result<(), Error> {
    if password.chars().count() > config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters long", config.max_length),
        });
    }

    let strength = password_strength(password, config.min_length);
    if let Some(failed) = strength.checks.iter().find(|c| !c.valid) {
        return Err(Error::BadRequest {
            message: format!("Password does not meet requirements: {}", failed.label.to_lowercase()),
        });
    }
    Ok(())
}
