use crate::{
    config::{self, Params},
    loader::{self, LoadError},
    materialize::{self, ApplyOptions, Report},
};
use std::path::Path;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ArborError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Materialize(#[from] materialize::MaterializeError),
}

/// Reads a params file naming a document and an output folder, then
/// materializes the document there.
///
/// # Errors
///
/// Returns an [`ArborError`] if:
///
/// - The params file is missing, malformed, or lacks `yaml_file`/`output_folder`.
/// - The document is missing or malformed.
/// - A path in the document escapes the output folder or a mode is not octal.
/// - A directory or file cannot be created or written to.
pub fn process_params(params_path: &Path, options: ApplyOptions) -> Result<Report, ArborError> {
    let params = Params::from_file(params_path)?;

    log::debug!(
        "params from {}: document={}, output_folder={}",
        params_path.display(),
        params.document.display(),
        params.output_folder.display()
    );

    process_document(&params.document, &params.output_folder, options)
}

/// Materializes the document at `document_path` under `output_root`.
///
/// # Errors
///
/// Same as [`process_params`], minus the params checks.
pub fn process_document(
    document_path: &Path,
    output_root: &Path,
    options: ApplyOptions,
) -> Result<Report, ArborError> {
    let document = loader::load_document(document_path)?;

    let report = materialize::materialize(&document, output_root, options)?;

    Ok(report)
}
