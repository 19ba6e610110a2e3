use indexmap::IndexMap;

/// Field name that always resolves to the raw destination of a record.
pub const DESTINATION_FIELD: &str = "destination";

/// One row of a recipient source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientRecord {
    destination: String,
    fields: IndexMap<String, String>,
}

impl RecipientRecord {
    #[must_use]
    pub fn new(destination: impl Into<String>, fields: IndexMap<String, String>) -> Self {
        Self { destination: destination.into(), fields }
    }

    /// Builds a record from a source row, taking the destination from `destination_field`.
    ///
    /// A record without that field gets an empty destination.
    #[must_use]
    pub fn from_fields(fields: IndexMap<String, String>, destination_field: &str) -> Self {
        let destination = fields
            .get(destination_field)
            .or_else(|| fields.get(DESTINATION_FIELD))
            .cloned()
            .unwrap_or_default();
        Self { destination, fields }
    }

    /// Raw destination as it appeared in the source.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    #[must_use]
    pub const fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    /// Looks up a substitution field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(value) => Some(value.as_str()),
            None if name == DESTINATION_FIELD => Some(self.destination.as_str()),
            None => None,
        }
    }
}

/// Strips the separators the provider rejects (`+`, space, `-`), leaving the bare digit string.
#[must_use]
pub fn normalize_destination(raw: &str) -> String {
    raw.chars().filter(|c| !matches!(c, '+' | ' ' | '-')).collect()
}
