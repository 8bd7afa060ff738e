// src/schema/mod.rs
//! The fixed set of fields pulled out of every PDF, with the label variants
//! that identify them and the value shape each one must have.

pub mod validate;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::utils::AppError;
pub use validate::{is_nullish, normalize, normalize_label, ValueKind};

/// One extractable field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Canonical snake_case name, unique in the schema.
    pub name: String,
    /// Column header used in the output spreadsheet.
    pub header: String,
    pub aliases: Vec<String>,
    pub kind: ValueKind,
}

impl FieldSpec {
    fn new(name: &str, header: &str, aliases: &[&str], kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            header: header.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            kind,
        }
    }

    /// Does this cell/label text name the field?
    pub fn matches_label(&self, text: &str) -> bool {
        let label = normalize_label(text);
        !label.is_empty() && self.aliases.iter().any(|alias| normalize_label(alias) == label)
    }
}

/// Extra aliases keyed by canonical field name, as read from a JSON file.
pub type AliasOverrides = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
    // normalized alias -> field index
    label_owner: HashMap<String, usize>,
}

impl FieldSchema {
    /// The 11 fields found on the enrolment/assignment forms this tool targets.
    pub fn standard() -> Self {
        use ValueKind::*;
        let fields = vec![
            FieldSpec::new(
                "site_number",
                "Site Number",
                &["Site Number", "Site No", "Site ID", "Derived Site ID"],
                Digits,
            ),
            FieldSpec::new("subject", "Subject", &["Subject", "Subject ID"], Identifier),
            FieldSpec::new(
                "birth_year",
                "Birth Year",
                &["Birth Year", "Year of Birth", "YOB"],
                Year,
            ),
            FieldSpec::new("age", "Age", &["Age"], Age),
            FieldSpec::new(
                "sex_reported_at_birth",
                "Sex Reported at Birth",
                &["Sex Reported at Birth"],
                Text,
            ),
            FieldSpec::new(
                "first_informed_consent_date",
                "First Informed Consent Date",
                &["First Informed Consent Date", "Informed Consent Date", "First Consent Date"],
                Date,
            ),
            FieldSpec::new(
                "randomization_date",
                "Randomization/Allocation Date",
                &[
                    "Randomization/Allocation Date",
                    "Randomization Date",
                    "Allocation Date",
                    "Randomization / Allocation Date",
                ],
                Date,
            ),
            FieldSpec::new(
                "randomization_number",
                "Randomization/Allocation Number",
                &[
                    "Randomization/Allocation Number",
                    "Randomization Number",
                    "Allocation Number",
                    "Randomization / Allocation Number",
                ],
                Digits,
            ),
            FieldSpec::new(
                "assignment",
                "Cohort Assignment",
                &["Cohort Assignment", "Cohort", "Assignment"],
                Text,
            ),
            FieldSpec::new(
                "component_id_assignment_date",
                "Date of Component ID Assignment",
                &[
                    "Date of Component ID Assignment",
                    "Component ID Assignment Date",
                    "Date of Component Assignment",
                ],
                Date,
            ),
            // Identifier, not free text: "Component ID Assignment Date ..." must not land here.
            FieldSpec::new(
                "component_id",
                "Component ID",
                &["Component ID", "Component Identifier", "ComponentID"],
                Identifier,
            ),
        ];

        // The built-in table is known to be consistent.
        Self::from_fields(fields).unwrap_or_else(|e| panic!("standard schema is invalid: {}", e))
    }

    fn from_fields(fields: Vec<FieldSpec>) -> Result<Self, String> {
        let mut label_owner: HashMap<String, usize> = HashMap::new();
        let mut names = HashMap::new();

        for (idx, field) in fields.iter().enumerate() {
            if names.insert(field.name.clone(), idx).is_some() {
                return Err(format!("duplicate field name '{}'", field.name));
            }
            if field.aliases.is_empty() {
                return Err(format!("field '{}' has no aliases", field.name));
            }
            for alias in &field.aliases {
                let key = normalize_label(alias);
                if key.is_empty() {
                    return Err(format!("field '{}' has an empty alias", field.name));
                }
                match label_owner.get(&key) {
                    Some(&owner) if owner != idx => {
                        return Err(format!(
                            "alias '{}' of field '{}' is already used by field '{}'",
                            alias, field.name, fields[owner].name
                        ));
                    }
                    _ => {
                        label_owner.insert(key, idx);
                    }
                }
            }
        }

        Ok(Self { fields, label_owner })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Output header row: filename first, then one column per field.
    pub fn headers(&self) -> Vec<String> {
        std::iter::once(crate::storage::FILENAME_HEADER.to_string())
            .chain(self.fields.iter().map(|f| f.header.clone()))
            .collect()
    }

    /// Index of the field owning this label text, if any.
    pub fn field_for_label(&self, text: &str) -> Option<usize> {
        self.label_owner.get(&normalize_label(text)).copied()
    }

    /// True when the text is a label (alias or header) of any field.
    pub fn is_label(&self, text: &str) -> bool {
        let key = normalize_label(text);
        self.label_owner.contains_key(&key)
            || self.fields.iter().any(|f| normalize_label(&f.header) == key)
    }

    /// Validates a raw candidate for field `idx`; returns the cleaned value when accepted.
    pub fn accept_candidate(&self, idx: usize, candidate: &str) -> Option<String> {
        let field = &self.fields[idx];
        let value = normalize(candidate);

        if is_nullish(&value) {
            tracing::trace!("Rejected null-like value '{}' for {}", value, field.name);
            return None;
        }
        if self.is_label(&value) {
            tracing::debug!("Rejected label text '{}' as value for {}", value, field.name);
            return None;
        }
        if !field.kind.accepts(&value) {
            tracing::debug!(
                "Rejected '{}' for {}: not a valid {:?} value",
                value,
                field.name,
                field.kind
            );
            return None;
        }
        Some(value)
    }

    /// Appends extra aliases to existing fields. The field list itself never changes.
    pub fn with_alias_overrides(self, overrides: &AliasOverrides) -> Result<Self, AppError> {
        let mut fields = self.fields;
        for (name, aliases) in overrides {
            let field = fields
                .iter_mut()
                .find(|f| &f.name == name)
                .ok_or_else(|| AppError::Config(format!("Unknown field '{}' in alias overrides", name)))?;
            for alias in aliases {
                let key = normalize_label(alias);
                if !field.aliases.iter().any(|a| normalize_label(a) == key) {
                    field.aliases.push(alias.clone());
                }
            }
        }
        Self::from_fields(fields).map_err(AppError::Config)
    }

    /// Loads `{"field_name": ["alias", ...]}` from a JSON file.
    pub fn load_alias_overrides(path: &Path) -> Result<AliasOverrides, AppError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("Invalid alias file {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_standard_schema_shape() {
        let schema = FieldSchema::standard();
        assert_eq!(schema.len(), 11);
        assert_eq!(schema.headers().len(), 12);
        assert_eq!(schema.headers()[0], crate::storage::FILENAME_HEADER);
        assert_eq!(schema.fields()[10].name, "component_id");
    }

    #[test]
    fn test_label_lookup_is_normalized() {
        let schema = FieldSchema::standard();
        let component = schema.index_of("component_id").unwrap();
        assert_eq!(schema.field_for_label("component  id:"), Some(component));
        assert_eq!(schema.field_for_label("COMPONENTID"), Some(component));
        assert_eq!(schema.field_for_label("Component"), None);
    }

    #[test]
    fn test_accept_candidate_rejects_labels_and_bad_shapes() {
        let schema = FieldSchema::standard();
        let component = schema.index_of("component_id").unwrap();
        let assignment = schema.index_of("assignment").unwrap();

        assert_eq!(schema.accept_candidate(component, " CMP-4471 "), Some("CMP-4471".to_string()));
        assert_eq!(schema.accept_candidate(component, "Assignment"), None);
        assert_eq!(schema.accept_candidate(component, "Assignment Date 12-Jun-2025"), None);
        assert_eq!(schema.accept_candidate(assignment, "Cohort:"), None);
        assert_eq!(schema.accept_candidate(assignment, "N/A"), None);
        assert_eq!(schema.accept_candidate(assignment, "Cohort B"), Some("Cohort B".to_string()));
    }

    #[test]
    fn test_alias_overrides_extend_fields() {
        let mut overrides = AliasOverrides::new();
        overrides.insert("component_id".to_string(), vec!["Comp. ID".to_string()]);

        let schema = FieldSchema::standard().with_alias_overrides(&overrides).unwrap();
        assert_eq!(schema.field_for_label("comp. id"), schema.index_of("component_id"));
        assert_eq!(schema.len(), 11);
    }

    #[test]
    fn test_alias_overrides_reject_unknown_and_conflicting() {
        let mut unknown = AliasOverrides::new();
        unknown.insert("weight".to_string(), vec!["Weight".to_string()]);
        assert!(matches!(
            FieldSchema::standard().with_alias_overrides(&unknown),
            Err(AppError::Config(_))
        ));

        let mut conflicting = AliasOverrides::new();
        conflicting.insert("component_id".to_string(), vec!["Assignment".to_string()]);
        assert!(matches!(
            FieldSchema::standard().with_alias_overrides(&conflicting),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_load_alias_overrides_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"subject": ["Participant"]}}"#).unwrap();

        let overrides = FieldSchema::load_alias_overrides(file.path()).unwrap();
        assert_eq!(overrides["subject"], vec!["Participant".to_string()]);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "[1, 2").unwrap();
        assert!(FieldSchema::load_alias_overrides(bad.path()).is_err());
    }
}
