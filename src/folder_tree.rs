//! Hierarchical grouping of report records for navigation.
//!
//! Each record's folder path is walked segment by segment: all but the last
//! segment become branches, the last one names the leaf holding the record.
//! Leaves borrow records from the database.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//! use visual_diff_report::database::{ImageRecord, ReportDatabase};
//! use visual_diff_report::folder_tree::FolderNode;
//!
//! let mut records = BTreeMap::new();
//! records.insert(
//!     "baseline/login/form.png".to_string(),
//!     ImageRecord {
//!         baseline: Some("baseline/login/form.png".to_string()),
//!         current: None,
//!         diff: None,
//!         folder_path: vec!["login".to_string(), "form.png".to_string()],
//!     },
//! );
//! let db = ReportDatabase { title: "UI".into(), root_directory: "/shots".into(), records };
//!
//! let tree = FolderNode::build(&db);
//! assert!(tree.child("login").is_some());
//! assert_eq!(tree.leaf_count(), 1);
//! ```
use crate::database::{ImageRecord, ReportDatabase};
use std::collections::BTreeMap;

/// A node of the folder tree.
///
/// Segment names are plain keys, the empty name included. A branch may also
/// hold a record of its own: one whose folder path ends at the branch, either
/// because it is empty (at the root) or because its leaf name collides with
/// the folder of another record.
#[derive(Debug, Clone, PartialEq)]
pub enum FolderNode<'a> {
    /// A single record.
    Leaf(&'a ImageRecord),
    /// A folder.
    Branch {
        /// Record whose folder path ends at this branch.
        record: Option<&'a ImageRecord>,
        /// Child nodes by segment name.
        children: BTreeMap<String, FolderNode<'a>>,
    },
}

impl<'a> FolderNode<'a> {
    /// Builds the tree for every record of the database.
    pub fn build(db: &'a ReportDatabase) -> Self {
        Self::from_records(db.records.values())
    }

    /// Builds the tree for the given records. Records with identical folder
    /// paths overwrite each other; the last one wins.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ImageRecord>,
    {
        let mut root = FolderNode::empty_branch();
        for record in records {
            root.insert(&record.folder_path, record);
        }
        root
    }

    fn empty_branch() -> Self {
        FolderNode::Branch {
            record: None,
            children: BTreeMap::new(),
        }
    }

    fn insert(&mut self, path: &[String], record: &'a ImageRecord) {
        let Some((head, rest)) = path.split_first() else {
            match self {
                FolderNode::Leaf(existing) => *existing = record,
                FolderNode::Branch { record: own, .. } => *own = Some(record),
            }
            return;
        };

        if let FolderNode::Leaf(existing) = *self {
            *self = FolderNode::Branch {
                record: Some(existing),
                children: BTreeMap::new(),
            };
        }
        if let FolderNode::Branch { children, .. } = self {
            match children.get_mut(head) {
                Some(child) => child.insert(rest, record),
                None => {
                    children.insert(head.clone(), Self::chain(rest, record));
                }
            }
        }
    }

    /// Fresh nodes for the remaining segments, ending in a leaf.
    fn chain(path: &[String], record: &'a ImageRecord) -> Self {
        match path.split_first() {
            None => FolderNode::Leaf(record),
            Some((head, rest)) => FolderNode::Branch {
                record: None,
                children: BTreeMap::from([(head.clone(), Self::chain(rest, record))]),
            },
        }
    }

    /// Returns the named child of a branch.
    pub fn child(&self, name: &str) -> Option<&FolderNode<'a>> {
        match self {
            FolderNode::Branch { children, .. } => children.get(name),
            FolderNode::Leaf(_) => None,
        }
    }

    /// Returns the record reached by walking `folder_path` from this node.
    pub fn record_at(&self, folder_path: &[String]) -> Option<&'a ImageRecord> {
        let mut node = self;
        for segment in folder_path {
            node = node.child(segment)?;
        }
        match node {
            FolderNode::Leaf(record) => Some(*record),
            FolderNode::Branch { record, .. } => *record,
        }
    }

    /// Every record in the tree with the folder path leading to it, in
    /// segment order.
    pub fn leaves(&self) -> Vec<(Vec<String>, &'a ImageRecord)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves(
        &self,
        prefix: &mut Vec<String>,
        out: &mut Vec<(Vec<String>, &'a ImageRecord)>,
    ) {
        match self {
            FolderNode::Leaf(record) => out.push((prefix.clone(), *record)),
            FolderNode::Branch { record, children } => {
                if let Some(record) = record {
                    out.push((prefix.clone(), *record));
                }
                for (name, child) in children {
                    prefix.push(name.clone());
                    child.collect_leaves(prefix, out);
                    prefix.pop();
                }
            }
        }
    }

    /// Number of records in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            FolderNode::Leaf(_) => 1,
            FolderNode::Branch { record, children } => {
                usize::from(record.is_some())
                    + children.values().map(FolderNode::leaf_count).sum::<usize>()
            }
        }
    }
}
