//! Form validation for signup and login
//!
//! Forms arrive as urlencoded bodies. Each field is optional at the
//! deserialization layer so a missing field and an empty one produce different
//! messages. Rules run in field declaration order and every failure is
//! collected; callers that only show one message use [`ValidationErrors::first`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Minimum password length accepted at signup
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Longest address accepted as an email, in UTF-16 code units
pub const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern is valid")
});

/// Raw signup form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Raw login form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Signup input that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login input that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLogin {
    pub email: String,
    pub password: String,
}

/// Which rule a field failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    NotEmpty,
    Email,
    MinLength(usize),
    MaxLength(usize),
}

/// A single field-level failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub rule: Rule,
}

impl FieldError {
    fn new(field: &'static str, rule: Rule) -> Self {
        Self { field, rule }
    }

    /// Human-readable message shown inline on the form
    pub fn message(&self) -> String {
        let field = self.field;
        match self.rule {
            Rule::Required => format!("\"{field}\" is required"),
            Rule::NotEmpty => format!("\"{field}\" is not allowed to be empty"),
            Rule::Email => format!("\"{field}\" must be a valid email"),
            Rule::MinLength(min) => {
                format!("\"{field}\" length must be at least {min} characters long")
            }
            Rule::MaxLength(max) => {
                format!("\"{field}\" length must be less than or equal to {max} characters long")
            }
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Every failure found in one form, in field order
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.first_message())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// The failure that gets reported to the user
    pub fn first(&self) -> &FieldError {
        // constructed only through `collect`, which never builds an empty list
        &self.errors[0]
    }

    pub fn first_message(&self) -> String {
        self.first().message()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    fn collect(errors: Vec<FieldError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }
}

/// Presence check shared by every string field
fn present<'a>(
    field: &'static str,
    value: &'a Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    match value.as_deref() {
        None => {
            errors.push(FieldError::new(field, Rule::Required));
            None
        }
        Some("") => {
            errors.push(FieldError::new(field, Rule::NotEmpty));
            None
        }
        Some(value) => Some(value),
    }
}

fn check_email(value: Option<&str>, errors: &mut Vec<FieldError>) {
    if let Some(email) = value {
        if email.encode_utf16().count() > MAX_EMAIL_LENGTH {
            errors.push(FieldError::new("email", Rule::MaxLength(MAX_EMAIL_LENGTH)));
        } else if !is_valid_email(email) {
            errors.push(FieldError::new("email", Rule::Email));
        }
    }
}

/// Structural email check: local part, `@`, dotted domain, no whitespace.
///
/// The top-level domain is not checked against the IANA registry, so
/// `ann@x.notarealtld` passes. Accounts are only matched by exact address,
/// never mailed.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

impl SignupForm {
    pub fn validate(&self) -> Result<ValidSignup, ValidationErrors> {
        let mut errors = Vec::new();

        let name = present("name", &self.name, &mut errors);
        let email = present("email", &self.email, &mut errors);
        check_email(email, &mut errors);
        let password = present("password", &self.password, &mut errors);
        if let Some(password) = password {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                errors.push(FieldError::new(
                    "password",
                    Rule::MinLength(MIN_PASSWORD_LENGTH),
                ));
            }
        }

        ValidationErrors::collect(errors)?;

        Ok(ValidSignup {
            name: name.unwrap_or_default().to_string(),
            email: email.unwrap_or_default().to_string(),
            password: password.unwrap_or_default().to_string(),
        })
    }
}

impl LoginForm {
    pub fn validate(&self) -> Result<ValidLogin, ValidationErrors> {
        let mut errors = Vec::new();

        let email = present("email", &self.email, &mut errors);
        check_email(email, &mut errors);
        let password = present("password", &self.password, &mut errors);

        ValidationErrors::collect(errors)?;

        Ok(ValidLogin {
            email: email.unwrap_or_default().to_string(),
            password: password.unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn test_valid_signup() {
        let valid = signup("Ann", "ann@x.com", "secret1").validate().unwrap();
        assert_eq!(valid.name, "Ann");
        assert_eq!(valid.email, "ann@x.com");
        assert_eq!(valid.password, "secret1");
    }

    #[test]
    fn test_signup_short_password() {
        let err = signup("Ann", "ann@x.com", "12345").validate().unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(
            err.first_message(),
            "\"password\" length must be at least 6 characters long"
        );
    }

    #[test]
    fn test_signup_first_failure_wins() {
        let err = signup("", "not-an-email", "123").validate().unwrap_err();
        assert_eq!(err.errors().len(), 3);
        assert_eq!(err.first().field, "name");
        assert_eq!(err.first_message(), "\"name\" is not allowed to be empty");
        assert_eq!(err.errors()[1].rule, Rule::Email);
        assert_eq!(err.errors()[2].rule, Rule::MinLength(MIN_PASSWORD_LENGTH));
    }

    #[test]
    fn test_signup_missing_fields() {
        let err = SignupForm::default().validate().unwrap_err();
        assert_eq!(err.first_message(), "\"name\" is required");
        assert!(err.errors().iter().all(|e| e.rule == Rule::Required));
    }

    #[test]
    fn test_login_requires_password() {
        let form = LoginForm {
            email: Some("ann@x.com".to_string()),
            password: Some(String::new()),
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.first_message(), "\"password\" is not allowed to be empty");
    }

    #[test]
    fn test_login_accepts_any_nonempty_password() {
        let form = LoginForm {
            email: Some("ann@x.com".to_string()),
            password: Some("x".to_string()),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("ann@x.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("ann@x"));
        assert!(!is_valid_email("ann x@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("ann@@x.com"));
        assert!(!is_valid_email("ann@x..com"));
    }

    #[test]
    fn test_overlong_email() {
        let email = format!("{}@x.com", "a".repeat(MAX_EMAIL_LENGTH));
        let err = signup("Ann", &email, "secret1").validate().unwrap_err();
        assert_eq!(err.first().rule, Rule::MaxLength(MAX_EMAIL_LENGTH));
    }

    #[test]
    fn test_email_length_counts_utf16_units() {
        // 130 astral characters are 260 UTF-16 units
        let email = format!("{}@x.io", "\u{1F600}".repeat(130));
        assert!(email.chars().count() < MAX_EMAIL_LENGTH);
        let err = signup("Ann", &email, "secret1").validate().unwrap_err();
        assert_eq!(err.first().rule, Rule::MaxLength(MAX_EMAIL_LENGTH));

        assert!(is_valid_email("ann@x.notarealtld"));
    }

    #[test]
    fn test_form_decoding_distinguishes_missing_and_empty() {
        let form: SignupForm = serde_urlencoded::from_str("name=&email=ann%40x.com").unwrap();
        assert_eq!(form.name.as_deref(), Some(""));
        assert_eq!(form.email.as_deref(), Some("ann@x.com"));
        assert!(form.password.is_none());
    }
}
