use miette::Diagnostic;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("required field is missing or empty: '{field}'")]
    #[diagnostic(
        code(arbor::document::missing_field),
        help("An explicit document needs `project.name`, e.g.\n\nproject:\n  name: demo\n  files: []")
    )]
    MissingField { field: &'static str },

    #[error("the `project` section does not match the expected shape: {source}")]
    #[diagnostic(
        code(arbor::document::invalid_schema),
        help("Each entry of `project.files` needs a `path`; `content` and `mode` are optional")
    )]
    InvalidSchema {
        #[source]
        source: serde_json::Error,
    },
}

/// The key whose presence switches a document to the explicit schema.
const PROJECT_KEY: &str = "project";

/// A parsed tree document, kept in the order its keys were written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);
impl Document {
    pub fn root(&self) -> &Map<String, Value> {
        &self.0
    }
    /// Detects which schema the document follows and validates the explicit one.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentError`] if a `project` section exists but has no name,
    /// or if its entries do not deserialize.
    pub fn schema(&self) -> Result<Schema<'_>, DocumentError> {
        let Some(section) = self.0.get(PROJECT_KEY) else {
            return Ok(Schema::Implicit(&self.0));
        };

        let raw: ProjectSection = match section {
            Value::Null => ProjectSection::default(),
            other => serde_json::from_value(other.clone())
                .map_err(|source| DocumentError::InvalidSchema { source })?,
        };

        let name = raw
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(DocumentError::MissingField {
                field: "project.name",
            })?;

        Ok(Schema::Explicit(Project {
            name,
            files: raw.files,
        }))
    }
}
impl From<Map<String, Value>> for Document {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// The two document shapes understood by the materializer.
#[derive(Debug)]
pub enum Schema<'a> {
    /// `project: { name, files: [...] }`
    Explicit(Project),
    /// Nested mappings are directories, everything else is a file.
    Implicit(&'a Map<String, Value>),
}

#[derive(Debug, Default, Deserialize)]
struct ProjectSection {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    files: Vec<FileEntry>,
}

/// `files:` with nothing after it reads as null, which means no files.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<FileEntry>, D::Error> {
    Ok(Option::<Vec<FileEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default)]
    pub content: Option<Value>,
    /// Quoted octal permission string such as `"755"`.
    #[serde(default)]
    pub mode: Option<Value>,
}
impl FileEntry {
    pub fn content_text(&self) -> String {
        self.content.as_ref().map(leaf_text).unwrap_or_default()
    }

    /// The mode as written, or `Err` with its text when it is not a string.
    ///
    /// Numbers are refused: yaml resolves an unquoted `0o644` to 420 and the
    /// octal spelling is gone by the time it gets here.
    pub fn mode_literal(&self) -> Option<Result<&str, String>> {
        match self.mode.as_ref()? {
            Value::Null => None,
            Value::String(raw) => Some(Ok(raw.as_str())),
            other => Some(Err(leaf_text(other))),
        }
    }
}

/// Text written for a non-mapping value.
pub fn leaf_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        // sequences and stray mappings are written as compact json
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn no_project_key_is_implicit() {
        let doc = document(json!({ "src": { "main.py": "print(1)" } }));

        assert!(matches!(doc.schema(), Ok(Schema::Implicit(_))));
    }

    #[test]
    fn project_key_is_explicit() {
        let doc = document(json!({
            "project": { "name": "demo", "files": [{ "path": "a.txt" }] }
        }));

        let Ok(Schema::Explicit(project)) = doc.schema() else {
            panic!("expected explicit schema");
        };

        assert_eq!(project.name, "demo");
        assert_eq!(project.files.len(), 1);
        assert_eq!(project.files[0].content_text(), "");
    }

    #[test]
    fn missing_or_blank_name_is_missing_field() {
        for doc in [
            document(json!({ "project": { "files": [] } })),
            document(json!({ "project": { "name": "  " } })),
            document(json!({ "project": null })),
        ] {
            assert!(matches!(
                doc.schema(),
                Err(DocumentError::MissingField {
                    field: "project.name"
                })
            ));
        }
    }

    #[test]
    fn entry_without_path_is_invalid_schema() {
        let doc = document(json!({
            "project": { "name": "demo", "files": [{ "content": "orphan" }] }
        }));

        assert!(matches!(
            doc.schema(),
            Err(DocumentError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn modes_must_be_strings() {
        let quoted: FileEntry =
            serde_json::from_value(json!({ "path": "run.sh", "mode": "755" })).unwrap();
        let numeric: FileEntry =
            serde_json::from_value(json!({ "path": "run.sh", "mode": 420 })).unwrap();
        let unset: FileEntry =
            serde_json::from_value(json!({ "path": "run.sh", "mode": null })).unwrap();

        assert_eq!(quoted.mode_literal(), Some(Ok("755")));
        assert_eq!(numeric.mode_literal(), Some(Err("420".to_string())));
        assert_eq!(unset.mode_literal(), None);
    }

    #[test]
    fn null_files_means_no_files() {
        let doc = document(json!({ "project": { "name": "demo", "files": null } }));

        let Ok(Schema::Explicit(project)) = doc.schema() else {
            panic!("expected explicit schema");
        };

        assert!(project.files.is_empty());
    }

    #[test]
    fn leaves_coerce_to_text() {
        assert_eq!(leaf_text(&json!("hi")), "hi");
        assert_eq!(leaf_text(&json!(42)), "42");
        assert_eq!(leaf_text(&json!(1.5)), "1.5");
        assert_eq!(leaf_text(&json!(true)), "true");
        assert_eq!(leaf_text(&Value::Null), "");
        assert_eq!(leaf_text(&json!(["a", 1])), r#"["a",1]"#);
    }
}
