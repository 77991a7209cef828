use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{PortalError, Result};

/// Profile fields entered on the auth screen. Lives only for the session.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub full_name: String,
    pub email: String,
    pub age: Option<u32>,
    #[serde(skip)]
    pub password: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdentityField {
    FullName,
    Email,
    Age,
    Password,
}

impl IdentityField {
    pub fn form_name(&self) -> &'static str {
        match self {
            IdentityField::FullName => "full_name",
            IdentityField::Email => "email",
            IdentityField::Age => "age",
            IdentityField::Password => "password",
        }
    }
}

impl FromStr for IdentityField {
    type Err = PortalError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "full_name" => Ok(IdentityField::FullName),
            "email" => Ok(IdentityField::Email),
            "age" => Ok(IdentityField::Age),
            "password" => Ok(IdentityField::Password),
            other => Err(PortalError::Validation(format!(
                "unknown identity field '{}'",
                other
            ))),
        }
    }
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one form input. Last write wins; a malformed age keeps the old value.
    pub fn set(&mut self, field: IdentityField, value: &str) -> Result<()> {
        match field {
            IdentityField::FullName => self.full_name = value.to_string(),
            IdentityField::Email => self.email = value.to_string(),
            IdentityField::Password => self.password = value.to_string(),
            IdentityField::Age => {
                let trimmed = value.trim();
                self.age = if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.parse().map_err(|_| {
                        PortalError::Validation(format!("age must be a whole number, got '{}'", trimmed))
                    })?)
                };
            }
        }
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }

    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            "Verified User"
        } else {
            &self.full_name
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_updates_are_last_write_wins() {
        let mut identity = Identity::new();
        identity.set(IdentityField::Email, "a@example.org").unwrap();
        identity.set(IdentityField::Email, "b@example.org").unwrap();
        assert_eq!(identity.email, "b@example.org");
    }

    #[test]
    fn age_parses_and_clears() {
        let mut identity = Identity::new();
        identity.set(IdentityField::Age, " 54 ").unwrap();
        assert_eq!(identity.age, Some(54));
        let err = identity.set(IdentityField::Age, "fifty").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(identity.age, Some(54));
        identity.set(IdentityField::Age, "").unwrap();
        assert_eq!(identity.age, None);
    }

    #[test]
    fn credentials_require_email_and_password() {
        let mut identity = Identity::new();
        identity.set(IdentityField::Password, "x").unwrap();
        assert!(!identity.has_credentials());
        identity.set(IdentityField::Email, "pat@example.org").unwrap();
        assert!(identity.has_credentials());
    }

    #[test]
    fn form_names_round_into_fields() {
        for field in [
            IdentityField::FullName,
            IdentityField::Email,
            IdentityField::Age,
            IdentityField::Password,
        ] {
            assert_eq!(field.form_name().parse::<IdentityField>().unwrap(), field);
        }
        assert!("phone".parse::<IdentityField>().is_err());
    }

    #[test]
    fn debug_masks_password() {
        let mut identity = Identity::new();
        identity.set(IdentityField::Password, "hunter2").unwrap();
        let printed = format!("{:?}", identity);
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn clear_resets_every_field() {
        let mut identity = Identity::new();
        identity.set(IdentityField::FullName, "Pat").unwrap();
        identity.set(IdentityField::Age, "40").unwrap();
        identity.clear();
        assert!(identity.is_empty());
        assert_eq!(identity.display_name(), "Verified User");
    }
}
