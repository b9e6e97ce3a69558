//! Materialize a tree of files and directories described in a yaml, json or
//! toml document.
//!
//! Two document shapes are understood. An explicit one names a project and
//! lists its files:
//!
//! ```yaml
//! project:
//!   name: demo
//!   files:
//!     - path: a/b.txt
//!       content: hi
//!     - path: run.sh
//!       content: "#!/bin/sh"
//!       mode: "755"
//! ```
//!
//! Anything without a `project` key is read as an implicit tree, where nested
//! mappings are directories and every other value is a file:
//!
//! ```yaml
//! src:
//!   main.py: print(1)
//! README: hello
//! ```
pub mod api;
pub mod config;
pub mod document;
pub mod errors;
pub mod loader;
pub mod materialize;
pub mod preview;
pub mod transactions;
pub mod utils;
pub mod vfs;

pub use api::{process_document, process_params, ArborError};
pub use materialize::{ApplyOptions, Report};
