//! Project folder models
//!
//! [`FolderNode`] describes the static hierarchy created in every new project.
//! One node carries the `uploads` marker; documents land in a dated submittal
//! folder below it.

use super::ids::FolderId;
use serde::{Deserialize, Serialize};

/// A node of the static project folder tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub name: String,

    /// Marks the folder that receives uploads
    #[serde(default)]
    pub uploads: bool,

    #[serde(default)]
    pub subdirs: Vec<FolderNode>,
}

impl FolderNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uploads: false,
            subdirs: Vec::new(),
        }
    }

    pub fn upload_target(mut self) -> Self {
        self.uploads = true;
        self
    }

    pub fn with_subdirs(mut self, subdirs: Vec<FolderNode>) -> Self {
        self.subdirs = subdirs;
        self
    }

    /// Total number of nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.subdirs.iter().map(FolderNode::count).sum::<usize>()
    }

    /// Name of the last node, in creation order, that carries the upload marker
    pub fn upload_folder_name(tree: &[FolderNode]) -> Option<&str> {
        let mut found = None;
        for node in tree {
            if let Some(name) = Self::upload_folder_name(&node.subdirs) {
                found = Some(name);
            }
            if node.uploads {
                found = Some(node.name.as_str());
            }
        }
        found
    }
}

/// The folder hierarchy created for every new permit project
pub fn default_folder_tree() -> Vec<FolderNode> {
    vec![FolderNode::new("CCSF EPR").with_subdirs(vec![
        FolderNode::new("A.PERMIT SUBMITTAL").with_subdirs(vec![
            FolderNode::new("1.PERMIT FORMS"),
            FolderNode::new("2.ROUTING FORMS"),
            FolderNode::new("3.DOCUMENTS FOR REVIEW").upload_target(),
        ]),
        FolderNode::new("B.APPROVED DOCUMENTS")
            .with_subdirs(vec![FolderNode::new("1.BUILDING PERMIT DOCUMENTS")]),
    ])]
}

/// A folder as listed by the document service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFolder {
    pub id: FolderId,
    pub name: String,
    pub parent_id: Option<FolderId>,
    pub path: Option<String>,
}
