//! Buyer contact details: e-mail, CPF/CNPJ document and phone number.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing buyer contact details.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The e-mail is empty or longer than the RFC 5321 limit.
    #[error("email must be between 1 and {max} characters")]
    EmailLength {
        /// Maximum allowed length.
        max: usize,
    },
    /// The e-mail lacks a non-empty local part, `@`, or domain.
    #[error("email must look like name@domain")]
    EmailShape,
    /// A CPF has 11 digits and a CNPJ has 14.
    #[error("CPF/CNPJ must have 11 or 14 digits (got {0})")]
    DocumentDigits(usize),
    /// Phone numbers carry 10 to 13 digits (DDD + number, optional DDI).
    #[error("phone must have between 10 and 13 digits (got {0})")]
    PhoneDigits(usize),
}

/// An e-mail address with basic structural validation.
///
/// ```
/// use preciosa_core::Email;
///
/// assert!(Email::parse("cliente@preciosa.com.br").is_ok());
/// assert!(Email::parse("sem-arroba").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an e-mail, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError`] if the address is empty, too long, or is not
    /// shaped `local@domain`.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() || s.len() > Self::MAX_LENGTH {
            return Err(ContactError::EmailLength {
                max: Self::MAX_LENGTH,
            });
        }
        match s.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(ContactError::EmailShape),
        }
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `@`, used as a display name fallback.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }
}

/// CPF (individual) or CNPJ (company) taxpayer document, digits only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Document(String);

impl Document {
    /// Parse a document, ignoring punctuation such as `000.000.000-00`.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::DocumentDigits`] unless 11 or 14 digits remain.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let digits = only_digits(s);
        match digits.len() {
            11 | 14 => Ok(Self(digits)),
            n => Err(ContactError::DocumentDigits(n)),
        }
    }

    /// Returns the digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for a 14-digit company document.
    #[must_use]
    pub fn is_cnpj(&self) -> bool {
        self.0.len() == 14
    }
}

/// A phone number, digits only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Parse a phone such as `(75) 99145-1074`.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::PhoneDigits`] when the digit count is out of range.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let digits = only_digits(s);
        if (10..=13).contains(&digits.len()) {
            Ok(Self(digits))
        } else {
            Err(ContactError::PhoneDigits(digits.len()))
        }
    }

    /// Returns the digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn only_digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

macro_rules! string_conversions {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ContactError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ContactError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_conversions!(Email);
string_conversions!(Document);
string_conversions!(Phone);
