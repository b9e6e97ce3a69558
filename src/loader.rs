use crate::{
    document::Document,
    errors::{FileFormat, FileOperation, IoError, ParseError},
};
use miette::Diagnostic;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("file not found: '{path}'")]
    #[diagnostic(
        code(arbor::loader::not_found),
        help("Pass an existing file, relative paths resolve from the working directory")
    )]
    NotFound { path: PathBuf },

    #[error("I/O error within loader domain")]
    #[diagnostic(code(arbor::loader::io))]
    Io(#[from] IoError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

impl FileFormat {
    /// Picks a parser from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            // yaml parses json too, so unknown extensions get the lenient parser
            _ => Self::Yaml,
        }
    }
}

fn parse_value(content: &str, format: FileFormat, path: &Path) -> Result<Value, ParseError> {
    // a blank yaml stream is an empty document; blank json is not valid json
    if format == FileFormat::Yaml && content.trim().is_empty() {
        return Ok(Value::Null);
    }

    let parsed = match format {
        FileFormat::Yaml => serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string()),
        FileFormat::Json => serde_json::from_str::<Value>(content).map_err(|e| e.to_string()),
        FileFormat::Toml => toml::from_str::<toml::Table>(content)
            .map(|table| toml_to_json(toml::Value::Table(table)))
            .map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| ParseError::new(format, path.to_path_buf(), message))
}

/// Reads `path` and deserializes it into `T`, choosing the format by extension.
///
/// An empty document is treated as an empty mapping. Anything other than a
/// mapping at the top level is a [`ParseError`].
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)
        .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

    let format = FileFormat::from_path(path);

    log::debug!("parsing {} as {}", path.display(), format);

    let value = match parse_value(&content, format, path)? {
        Value::Null => Value::Object(Default::default()),
        value @ Value::Object(_) => value,
        other => {
            return Err(ParseError::new(
                format,
                path.to_path_buf(),
                format!("expected a mapping at the top level, found {}", kind_of(&other)),
            )
            .into())
        }
    };

    serde_json::from_value(value)
        .map_err(|error| ParseError::new(format, path.to_path_buf(), error).into())
}

/// Loads a tree document from disk.
pub fn load_document(path: &Path) -> Result<Document, LoadError> {
    load(path)
}

/// Datetimes become their RFC 3339 text so they stay leaves.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(number) => Value::from(number),
        toml::Value::Float(number) => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(number.to_string())),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
