use crate::vfs::VirtualFS;
use colored::Colorize;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Represents a node in the tree (either file or directory).
#[derive(Debug)]
struct TreeNode {
    name: String,
    children: Vec<Rc<RefCell<TreeNode>>>,
    is_file: bool,
}
impl TreeNode {
    fn new(name: String, is_file: bool) -> Self {
        Self {
            name,
            children: Vec::new(),
            is_file,
        }
    }
}

/// Finds the node for `path`, creating it and any missing parents as directories.
fn node_for(
    lookup: &mut IndexMap<PathBuf, Rc<RefCell<TreeNode>>>,
    path: &Path,
) -> Rc<RefCell<TreeNode>> {
    if let Some(node) = lookup.get(path) {
        return Rc::clone(node);
    }

    let parent = node_for(lookup, path.parent().unwrap_or_else(|| Path::new("")));

    let name = path
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let node = Rc::new(RefCell::new(TreeNode::new(name, false)));
    parent.borrow_mut().children.push(Rc::clone(&node));
    lookup.insert(path.to_path_buf(), Rc::clone(&node));

    node
}

/// Build the directory tree from the planned entries, returning the root node.
fn build_tree(vfs: &VirtualFS, destination: &Path) -> Rc<RefCell<TreeNode>> {
    let root_name = destination
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| destination.display().to_string());

    let root = Rc::new(RefCell::new(TreeNode::new(root_name, false)));

    // relative paths keyed to their node, the empty path is the root
    let mut lookup: IndexMap<PathBuf, Rc<RefCell<TreeNode>>> = IndexMap::new();
    lookup.insert(PathBuf::new(), Rc::clone(&root));

    for directory in &vfs.directories {
        node_for(&mut lookup, directory);
    }

    for entry in &vfs.files {
        let node = node_for(&mut lookup, &entry.destination);
        node.borrow_mut().is_file = true;
    }

    root
}

/// Print the tree with a nice ASCII style.
fn print_tree(node: &Rc<RefCell<TreeNode>>, prefix: &str, is_last: bool) {
    let node_borrow = node.borrow();

    let connector = if is_last {
        "└── ".yellow()
    } else {
        "├── ".yellow()
    };
    let name = if node_borrow.is_file {
        node_borrow.name.green()
    } else {
        node_borrow.name.blue()
    };
    println!("{}{}{}", prefix.yellow(), connector, name);

    let child_prefix = if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}│   ", prefix)
    };

    let len = node_borrow.children.len();
    for (i, child) in node_borrow.children.iter().enumerate() {
        let last = i == len - 1;
        print_tree(child, &child_prefix, last);
    }
}

/// Prints what a run would create under `destination`, without writing anything.
pub fn preview_as_tree(vfs: &VirtualFS, destination: &Path) {
    let tree_root = build_tree(vfs, destination);

    println!(
        "Legend: {} = (directory), {} = (file)",
        "blue".blue(),
        "green".green()
    );

    println!(
        "{} {}\n",
        "┌─".bold().bright_blue(),
        "Dry run".bold().bright_blue(),
    );

    print_tree(&tree_root, "", true);

    println!(
        "\n{} {}",
        "└─".bold().bright_blue(),
        format!("{} files planned, nothing written", vfs.files.len()).bright_green()
    );
}
