//! Environment variable value model for container workloads.
//!
//! Unique responsibility: encode and decode the polymorphic
//! `envVariables` map entries the containers API uses on jobs and
//! services.
//!
//! The wire format is a union of three shapes under one map key:
//! - a bare JSON string (literal value),
//! - `{"encryptionKey": "...", "encryptedValue": "..."}` (ciphertext the
//!   platform decrypts at runtime),
//! - `{"plainValue": "..."}` (plaintext the platform encrypts at rest).
//!
//! A response may combine several shapes in one object; the model keeps
//! every populated field so nothing is dropped on a round trip.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One environment variable value in any of the supported shapes.
///
/// Typically exactly one variant is populated; over-specified entries
/// (several variants at once) are preserved verbatim rather than
/// truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVariableValue {
    /// Literal value, passed to the container as-is.
    pub string_value: Option<String>,
    /// Identifier of the key that decrypts `encrypted_value`.
    pub encryption_key: Option<String>,
    /// Ciphertext decrypted server-side with `encryption_key`.
    pub encrypted_value: Option<String>,
    /// Plaintext the platform encrypts at rest on receipt.
    pub plain_value: Option<String>,
}

impl EnvVariableValue {
    /// Build a literal string value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Build an encrypted value from a key identifier and ciphertext.
    #[must_use]
    pub fn encrypted(encryption_key: impl Into<String>, encrypted_value: impl Into<String>) -> Self {
        Self {
            encryption_key: Some(encryption_key.into()),
            encrypted_value: Some(encrypted_value.into()),
            ..Self::default()
        }
    }

    /// Build a plaintext value for server-side encryption.
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            plain_value: Some(value.into()),
            ..Self::default()
        }
    }

    /// True when no field is populated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.string_value.is_none()
            && self.encryption_key.is_none()
            && self.encrypted_value.is_none()
            && self.plain_value.is_none()
    }

    /// Encode into the wire shape.
    ///
    /// A single populated variant produces its minimal form: a bare JSON
    /// string, an `{encryptionKey, encryptedValue}` object, or a
    /// `{plainValue}` object. Multiple populated variants produce one
    /// combined object carrying every field, so an over-specified entry
    /// survives unchanged. The encryption pair is only emitted when both
    /// halves are present; an empty entry encodes as `null`.
    #[must_use]
    pub fn encode(&self) -> Value {
        if let Some(value) = &self.string_value
            && self.encryption_key.is_none()
            && self.encrypted_value.is_none()
            && self.plain_value.is_none()
        {
            return Value::String(value.clone());
        }

        let mut fields = Map::new();
        if let Some(value) = &self.string_value {
            fields.insert("string".to_string(), Value::String(value.clone()));
        }
        if let (Some(key), Some(value)) = (&self.encryption_key, &self.encrypted_value) {
            fields.insert("encryptionKey".to_string(), Value::String(key.clone()));
            fields.insert("encryptedValue".to_string(), Value::String(value.clone()));
        }
        if let Some(value) = &self.plain_value {
            fields.insert("plainValue".to_string(), Value::String(value.clone()));
        }

        if fields.is_empty() {
            return Value::Null;
        }
        Value::Object(fields)
    }

    /// Decode from the wire shape.
    ///
    /// A bare JSON string becomes a literal value. An object contributes
    /// every recognized key that carries a string (`string`,
    /// `encryptionKey`, `encryptedValue`, `plainValue`).
    ///
    /// # Errors
    ///
    /// Returns [`EnvValueDecodeError`] when the value is neither a string
    /// nor an object containing at least one recognized key. Losing an
    /// environment variable silently would corrupt workload state, so the
    /// caller must treat this as fatal for the field.
    pub fn decode(value: &Value) -> Result<Self, EnvValueDecodeError> {
        match value {
            Value::String(literal) => Ok(Self::string(literal.clone())),
            Value::Object(fields) => {
                let decoded = Self {
                    string_value: string_field(fields, "string"),
                    encryption_key: string_field(fields, "encryptionKey"),
                    encrypted_value: string_field(fields, "encryptedValue"),
                    plain_value: string_field(fields, "plainValue"),
                };
                if decoded.is_empty() {
                    return Err(EnvValueDecodeError::UnrecognizedFormat);
                }
                Ok(decoded)
            }
            _ => Err(EnvValueDecodeError::UnrecognizedFormat),
        }
    }
}

impl Serialize for EnvVariableValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.encode().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EnvVariableValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::decode(&value).map_err(D::Error::custom)
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Error type for environment variable value decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvValueDecodeError {
    /// The JSON value was neither a string nor an object carrying any
    /// recognized field.
    UnrecognizedFormat,
}

impl fmt::Display for EnvValueDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedFormat => {
                write!(f, "unrecognized environment variable value format")
            }
        }
    }
}

impl std::error::Error for EnvValueDecodeError {}
