//! Canary form fields as submitted to the settings-update endpoint.

use std::fmt;

/// Fields the validator understands. Every other form field is passed through
/// to the query string untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanaryField {
    HeaderValue,
    HeaderPattern,
    Weight,
}

impl CanaryField {
    pub const ALL: [CanaryField; 3] = [Self::HeaderValue, Self::HeaderPattern, Self::Weight];

    /// Name of the field on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeaderValue => "header_value",
            Self::HeaderPattern => "header_pattern",
            Self::Weight => "weight",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for CanaryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw values of the three validated fields, exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanaryFields {
    pub header_value: String,
    pub header_pattern: String,
    pub weight: String,
}

impl CanaryFields {
    pub fn new(
        header_value: impl Into<String>,
        header_pattern: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        Self {
            header_value: header_value.into(),
            header_pattern: header_pattern.into(),
            weight: weight.into(),
        }
    }

    /// Pick the validated fields out of an ordered list of form pairs. Missing
    /// fields read as empty; when a name repeats, the first occurrence wins.
    pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let lookup = |field: CanaryField| {
            pairs
                .iter()
                .find(|(name, _)| name.as_ref() == field.as_str())
                .map(|(_, value)| value.as_ref().to_string())
                .unwrap_or_default()
        };

        Self {
            header_value: lookup(CanaryField::HeaderValue),
            header_pattern: lookup(CanaryField::HeaderPattern),
            weight: lookup(CanaryField::Weight),
        }
    }

    pub fn get(&self, field: CanaryField) -> &str {
        match field {
            CanaryField::HeaderValue => &self.header_value,
            CanaryField::HeaderPattern => &self.header_pattern,
            CanaryField::Weight => &self.weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_ignores_unrelated_fields() {
        let pairs = [
            ("namespace", "prod"),
            ("ingress", "web"),
            ("weight", "25"),
            ("header_value", "always"),
            ("cookie", "canary"),
        ];

        let fields = CanaryFields::from_pairs(&pairs);
        assert_eq!(fields, CanaryFields::new("always", "", "25"));
    }

    #[test]
    fn field_names_round_trip() {
        for field in CanaryField::ALL {
            assert_eq!(CanaryField::from_name(field.as_str()), Some(field));
        }
        assert_eq!(CanaryField::from_name("cookie"), None);
    }
}
