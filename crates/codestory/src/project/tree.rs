use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::classify::{describe_file, is_code_file, should_skip_path};
use crate::error::ScanError;

/// One node of the filtered directory structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    Folder {
        name: String,
        path: String,
        children: Vec<TreeNode>,
    },
    File {
        name: String,
        path: String,
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
}

impl TreeNode {
    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Folder {
            name: name.into(),
            path: path.into(),
            children: Vec::new(),
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let description = describe_file(Path::new(&path)).to_string();
        Self::File {
            name: name.into(),
            path,
            description,
            summary: None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Folder { name, .. } | Self::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Folder { path, .. } | Self::File { path, .. } => path,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            Self::Folder { children, .. } => children,
            Self::File { .. } => &[],
        }
    }

    /// True when at least one file anywhere below resolves to a code file.
    /// Folders without retained children therefore count as empty.
    pub fn contains_code(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::File { path, .. } if is_code_file(Path::new(path)) => return true,
                Self::File { .. } => {}
                Self::Folder { children, .. } => stack.extend(children.iter()),
            }
        }
        false
    }

    /// Visits every file node mutably, depth first.
    pub fn for_each_file_mut(&mut self, mut f: impl FnMut(&str, &mut Option<String>)) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::File { path, summary, .. } => f(path.as_str(), summary),
                Self::Folder { children, .. } => stack.extend(children.iter_mut()),
            }
        }
    }

    /// Names of the folders directly below this node, in tree order.
    pub fn top_level_folders(&self) -> Vec<&str> {
        self.children()
            .iter()
            .filter(|c| matches!(c, Self::Folder { .. }))
            .map(|c| c.name())
            .collect()
    }
}

/// Joins the components of `path` relative to `root` with `/`.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Builds the display tree below `root`.
///
/// Traversal is iterative and sorted by file name, so deep archives cannot
/// exhaust the stack and identical input yields identical trees. Skipped
/// paths and dotfiles are left out; symlinks are not followed.
pub fn build_tree(root: &Path) -> Result<TreeNode, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let root_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();

    // stack[d] is the open folder at depth d
    let mut stack: Vec<TreeNode> = vec![TreeNode::folder(root_name, "")];

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let hidden = entry.file_name().to_str().map_or(true, is_hidden);
            !hidden && !should_skip_path(entry.path().strip_prefix(root).unwrap_or(entry.path()))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable tree entry: {}", e);
                continue;
            }
        };

        while stack.len() > entry.depth() {
            close_folder(&mut stack);
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let path = relative_path(root, entry.path());

        if entry.file_type().is_dir() {
            stack.push(TreeNode::folder(name, path));
        } else if entry.file_type().is_file() {
            if let Some(TreeNode::Folder { children, .. }) = stack.last_mut() {
                children.push(TreeNode::file(name, path));
            }
        }
    }

    while stack.len() > 1 {
        close_folder(&mut stack);
    }

    stack.pop().ok_or_else(|| ScanError::MissingRoot(root.to_path_buf()))
}

fn close_folder(stack: &mut Vec<TreeNode>) {
    if let Some(done) = stack.pop() {
        if let Some(TreeNode::Folder { children, .. }) = stack.last_mut() {
            children.push(done);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_tree_is_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/b.py", "");
        write(tmp.path(), "src/a.py", "");
        write(tmp.path(), "README.md", "");
        write(tmp.path(), ".env", "SECRET=1");
        write(tmp.path(), "node_modules/x/index.js", "");
        write(tmp.path(), "logo.png", "");

        let tree = build_tree(tmp.path()).unwrap();
        let names: Vec<_> = tree.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["README.md", "src"]);

        let src = &tree.children()[1];
        assert_eq!(src.path(), "src");
        let files: Vec<_> = src.children().iter().map(|c| c.path()).collect();
        assert_eq!(files, vec!["src/a.py", "src/b.py"]);
    }

    #[test]
    fn test_file_nodes_carry_descriptions() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "main.py", "");
        let tree = build_tree(tmp.path()).unwrap();
        match &tree.children()[0] {
            TreeNode::File {
                description,
                summary,
                ..
            } => {
                assert_eq!(description, "Python source - backend logic");
                assert!(summary.is_none());
            }
            other => panic!("expected file node, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_empty_folders_are_not_code() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();
        write(tmp.path(), "a/b/notes.md", "");
        let tree = build_tree(tmp.path()).unwrap();
        assert!(!tree.contains_code());
    }

    #[test]
    fn test_deep_code_file_is_found() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/b/c/d/e/f/deep.ts", "");
        let tree = build_tree(tmp.path()).unwrap();
        assert!(tree.contains_code());
        assert_eq!(tree.top_level_folders(), vec!["a"]);
    }

    #[test]
    fn test_missing_root() {
        let tmp = TempDir::new().unwrap();
        let result = build_tree(&tmp.path().join("missing"));
        assert!(matches!(result, Err(ScanError::MissingRoot(_))));
    }

    #[test]
    fn test_serialized_kind_tag() {
        let node = TreeNode::file("a.py", "src/a.py");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["path"], "src/a.py");

        let folder = TreeNode::folder("src", "src");
        assert_eq!(serde_json::to_value(&folder).unwrap()["kind"], "folder");
    }

    #[test]
    fn test_for_each_file_mut_sets_summaries() {
        let mut tree = TreeNode::Folder {
            name: String::new(),
            path: String::new(),
            children: vec![TreeNode::file("a.py", "a.py"), TreeNode::file("b.md", "b.md")],
        };
        tree.for_each_file_mut(|path, summary| {
            if path == "a.py" {
                *summary = Some("entry point".to_string());
            }
        });
        match &tree.children()[0] {
            TreeNode::File { summary, .. } => assert_eq!(summary.as_deref(), Some("entry point")),
            _ => unreachable!(),
        }
    }
}
