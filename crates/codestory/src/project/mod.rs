pub mod scanner;
pub mod summary;
pub mod tree;

pub use scanner::{sanitized_preview, ProjectScanner};
pub use summary::{large_file_note, FileSummary};
pub use tree::{build_tree, TreeNode};
