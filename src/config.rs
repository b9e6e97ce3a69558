use crate::loader::{self, LoadError};
use miette::Diagnostic;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("could not load params")]
    #[diagnostic(code(arbor::config::load))]
    Load(#[from] LoadError),

    #[error("params are missing '{field}'")]
    #[diagnostic(
        code(arbor::config::missing_config),
        help("Params need both a document and an output folder, e.g.\n\nyaml_file: structure.yaml\noutput_folder: out")
    )]
    MissingConfig { field: &'static str },
}

/// Raw params as written on disk. Any of the document keys may be used.
#[derive(Debug, Default, Deserialize)]
struct RawParams {
    yaml_file: Option<PathBuf>,
    json_file: Option<PathBuf>,
    document: Option<PathBuf>,
    output_folder: Option<PathBuf>,
}

/// Top-level run configuration: which document to read and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    pub document: PathBuf,
    pub output_folder: PathBuf,
}
impl Params {
    /// Loads params from a yaml, json or toml file.
    ///
    /// Relative paths inside the file are kept as written and resolve from the
    /// working directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw: RawParams = loader::load(path.as_ref())?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawParams) -> Result<Self, ConfigError> {
        let document = raw
            .yaml_file
            .or(raw.json_file)
            .or(raw.document)
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(ConfigError::MissingConfig { field: "yaml_file" })?;

        let output_folder = raw
            .output_folder
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(ConfigError::MissingConfig {
                field: "output_folder",
            })?;

        Ok(Self {
            document,
            output_folder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn yaml_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "params.yaml",
            "yaml_file: tree.yaml\noutput_folder: out\n",
        );

        let params = Params::from_file(path).unwrap();

        assert_eq!(params.document, PathBuf::from("tree.yaml"));
        assert_eq!(params.output_folder, PathBuf::from("out"));
    }

    #[test]
    fn json_file_key_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "params.json",
            r#"{"json_file": "tree.json", "output_folder": "out"}"#,
        );

        let params = Params::from_file(path).unwrap();

        assert_eq!(params.document, PathBuf::from("tree.json"));
    }

    #[test]
    fn missing_fields_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let no_output = write(dir.path(), "a.yaml", "yaml_file: tree.yaml\n");
        let no_document = write(dir.path(), "b.yaml", "output_folder: out\n");

        assert!(matches!(
            Params::from_file(no_output),
            Err(ConfigError::MissingConfig {
                field: "output_folder"
            })
        ));
        assert!(matches!(
            Params::from_file(no_document),
            Err(ConfigError::MissingConfig { field: "yaml_file" })
        ));
    }

    #[test]
    fn missing_params_file_is_a_load_error() {
        assert!(matches!(
            Params::from_file("no/such/params.yaml"),
            Err(ConfigError::Load(LoadError::NotFound { .. }))
        ));
    }
}
