use crate::{
    document::{leaf_text, Document, DocumentError, FileEntry, Project, Schema},
    errors::{FileOperation, IoError},
    preview::preview_as_tree,
    transactions::{Active, RollbackOperation, Transaction},
    utils::{confine_path, parse_octal_mode},
    vfs::{VirtualEntry, VirtualFS},
};
use colored::Colorize;
use miette::Diagnostic;
use serde_json::{Map, Value};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MaterializeError {
    #[error("I/O error within materialize domain")]
    #[diagnostic(code(arbor::materialize::io))]
    Io(#[from] IoError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error("path escapes the output folder: '{path}'")]
    #[diagnostic(
        code(arbor::materialize::path_escape),
        help("Use relative paths without `..` segments")
    )]
    PathEscape { path: String },

    #[error("invalid permission mode '{mode}' for '{path}'")]
    #[diagnostic(
        code(arbor::materialize::invalid_mode),
        help("Modes are quoted octal literals such as \"755\" or \"0644\"")
    )]
    InvalidMode { path: PathBuf, mode: String },
}

/// Knobs for [`apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Print the planned tree instead of writing it.
    pub dry_run: bool,
    /// Undo this run's changes when a step fails.
    pub rollback: bool,
}
impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            rollback: true,
        }
    }
}

/// What a run wrote, or would write for a dry run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub output_root: PathBuf,
    /// `output_root/project.name` for explicit documents.
    pub project_folder: Option<PathBuf>,
    pub files: Vec<PathBuf>,
    /// Topmost directories that did not exist before the run.
    pub created_directories: Vec<PathBuf>,
    pub dry_run: bool,
}

/// Turns a document into a [`VirtualFS`] without touching the disk.
///
/// Explicit documents are rooted at a folder named after the project; implicit
/// ones map their top-level keys straight under the output root.
///
/// # Errors
///
/// Returns a [`MaterializeError`] if the document is malformed, a path would
/// leave the output root, or a mode is not octal.
pub fn plan(document: &Document) -> Result<VirtualFS, MaterializeError> {
    let mut vfs = VirtualFS::new();

    match document.schema()? {
        Schema::Explicit(project) => plan_project(&project, &mut vfs)?,
        Schema::Implicit(root) => plan_tree(root, Path::new(""), &mut vfs)?,
    }

    log::debug!(
        "planned {} files and {} directories",
        vfs.files.len(),
        vfs.directories.len()
    );

    Ok(vfs)
}

fn plan_project(project: &Project, vfs: &mut VirtualFS) -> Result<(), MaterializeError> {
    let folder = confine(&project.name, Path::new(""))?;

    vfs.directories.push(folder.clone());

    for entry in &project.files {
        vfs.files.push(plan_entry(entry, &folder)?);
    }

    vfs.project = Some(folder);

    Ok(())
}

fn plan_entry(entry: &FileEntry, folder: &Path) -> Result<VirtualEntry, MaterializeError> {
    let destination = folder.join(confine(&entry.path, folder)?);

    let invalid = |mode: String| MaterializeError::InvalidMode {
        path: destination.clone(),
        mode,
    };

    let mode = match entry.mode_literal() {
        Some(Ok(raw)) => Some(parse_octal_mode(raw).ok_or_else(|| invalid(raw.to_string()))?),
        Some(Err(unquoted)) => return Err(invalid(unquoted)),
        None => None,
    };

    Ok(VirtualEntry {
        destination,
        content: entry.content_text(),
        mode,
    })
}

/// Depth-first walk: mappings become directories, anything else a file.
fn plan_tree(
    node: &Map<String, Value>,
    parent: &Path,
    vfs: &mut VirtualFS,
) -> Result<(), MaterializeError> {
    for (key, value) in node {
        let path = parent.join(confine(key, parent)?);

        match value {
            Value::Object(children) => plan_tree(children, &path, vfs)?,
            leaf => vfs.files.push(VirtualEntry {
                destination: path,
                content: leaf_text(leaf),
                mode: None,
            }),
        }
    }

    Ok(())
}

fn confine(raw: &str, parent: &Path) -> Result<PathBuf, MaterializeError> {
    confine_path(raw).ok_or_else(|| MaterializeError::PathEscape {
        path: parent.join(raw).display().to_string(),
    })
}

/// Writes a [`VirtualFS`] under `output_root`.
///
/// The output root is created first, then the planned directories, then every
/// file in plan order. With `rollback` set, a failure undoes everything this
/// run created or overwrote before the error is returned.
///
/// # Errors
///
/// Returns a [`MaterializeError`] if a directory, file, or permission change fails.
pub fn apply(
    vfs: &VirtualFS,
    output_root: &Path,
    options: ApplyOptions,
) -> Result<Report, MaterializeError> {
    let mut report = Report {
        output_root: output_root.to_path_buf(),
        project_folder: vfs.project.as_ref().map(|folder| output_root.join(folder)),
        dry_run: options.dry_run,
        ..Report::default()
    };

    if options.dry_run {
        preview_as_tree(vfs, output_root);
        report.files = vfs
            .files
            .iter()
            .map(|entry| output_root.join(&entry.destination))
            .collect();

        return Ok(report);
    }

    if vfs.is_empty() {
        log::warn!("document describes no files, only the output folder is created");
    }

    let mut trx = Transaction::<Active>::new();

    let outcome = apply_vfs(vfs, output_root, &mut trx, &mut report);

    match outcome {
        Ok(()) => {
            trx.commit();
            Ok(report)
        }
        Err(error) if options.rollback => {
            log::debug!(
                "materialization failed, undoing {} operations",
                trx.pending()
            );
            trx.cancel();
            Err(error)
        }
        Err(error) => {
            trx.commit();
            Err(error)
        }
    }
}

fn apply_vfs(
    vfs: &VirtualFS,
    output_root: &Path,
    trx: &mut Transaction<Active>,
    report: &mut Report,
) -> Result<(), MaterializeError> {
    create_directory(trx, output_root, report)?;

    for directory in &vfs.directories {
        create_directory(trx, &output_root.join(directory), report)?;
    }

    for entry in &vfs.files {
        let final_path = output_root.join(&entry.destination);

        if let Some(parent) = final_path.parent() {
            create_directory(trx, parent, report)?;
        }

        write_file(trx, &final_path, &entry.content, entry.mode)?;

        report.files.push(final_path);
    }

    Ok(())
}

/// [`plan`] followed by [`apply`].
///
/// # Errors
///
/// Returns a [`MaterializeError`] from either phase. Planning errors leave the
/// disk untouched.
pub fn materialize(
    document: &Document,
    output_root: &Path,
    options: ApplyOptions,
) -> Result<Report, MaterializeError> {
    let vfs = plan(document)?;

    apply(&vfs, output_root, options)
}

/// Creates `path` and any missing ancestors.
///
/// Only the topmost directory that did not exist yet is registered for
/// rollback, so pre-existing folders are never removed.
fn create_directory(
    trx: &mut Transaction<Active>,
    path: &Path,
    report: &mut Report,
) -> Result<(), MaterializeError> {
    let topmost_missing = path
        .ancestors()
        .take_while(|ancestor| !ancestor.as_os_str().is_empty() && !ancestor.exists())
        .last()
        .map(Path::to_path_buf);

    fs::create_dir_all(path)
        .map_err(|error| IoError::new(FileOperation::Mkdir, path.into(), error))?;

    if let Some(created) = topmost_missing {
        log::debug!("created directory {}", created.display());
        trx.add_operation(RollbackOperation::RemoveDir(created.clone()));
        report.created_directories.push(created);
    }

    Ok(())
}

/// Writes `contents` to `path`, replacing whatever was there, then applies `mode`.
///
/// The rollback operation is registered before writing, so a half-written file
/// is also undone: removed if it is new, restored if it was overwritten. An
/// overwritten file without a planned mode keeps its previous permissions.
fn write_file(
    trx: &mut Transaction<Active>,
    path: &Path,
    contents: &str,
    mode: Option<u32>,
) -> Result<(), MaterializeError> {
    let previous = match fs::metadata(path) {
        Ok(metadata) => {
            let permissions = metadata.permissions();
            // an earlier run may have left the file read-only or unreadable
            unlock(path, &permissions)?;
            let bytes = fs::read(path)
                .map_err(|error| IoError::new(FileOperation::Read, path.into(), error))?;
            Some((bytes, permissions))
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => None,
        Err(error) => Err(IoError::new(FileOperation::Read, path.into(), error))?,
    };

    let kept_permissions = previous.as_ref().map(|(_, permissions)| permissions.clone());

    trx.add_operation(match previous {
        Some((contents, permissions)) => RollbackOperation::RestoreFile {
            path: path.to_path_buf(),
            contents,
            permissions,
        },
        None => RollbackOperation::RemoveFile(path.to_path_buf()),
    });

    fs::write(path, contents)
        .map_err(|error| IoError::new(FileOperation::Write, path.into(), error))?;

    match (mode, kept_permissions) {
        (Some(mode), _) => set_mode(path, mode)?,
        (None, Some(permissions)) => fs::set_permissions(path, permissions)
            .map_err(|error| IoError::new(FileOperation::Chmod, path.into(), error))?,
        (None, None) => {}
    }

    println!("{} {}", "create".green(), path.display());

    Ok(())
}

/// Gives the owner read and write access to an existing file.
#[cfg(unix)]
fn unlock(path: &Path, permissions: &fs::Permissions) -> Result<(), MaterializeError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = permissions.mode();
    if mode & 0o600 != 0o600 {
        fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o600))
            .map_err(|error| IoError::new(FileOperation::Chmod, path.into(), error))?;
    }

    Ok(())
}

#[cfg(not(unix))]
fn unlock(path: &Path, permissions: &fs::Permissions) -> Result<(), MaterializeError> {
    if permissions.readonly() {
        let mut writable = permissions.clone();
        writable.set_readonly(false);
        fs::set_permissions(path, writable)
            .map_err(|error| IoError::new(FileOperation::Chmod, path.into(), error))?;
    }

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), MaterializeError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|error| IoError::new(FileOperation::Chmod, path.into(), error))?;

    log::debug!("set mode {:o} on {}", mode, path.display());

    Ok(())
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<(), MaterializeError> {
    log::warn!(
        "ignoring mode {:o} for {}: permission bits are unix only",
        mode,
        path.display()
    );

    Ok(())
}
