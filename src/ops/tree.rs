use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::item::{Folder, SortingMode, Template};

/// Parent-to-children index over the flat template and folder lists.
///
/// Built once per batch of operations. Parent references that point at a
/// folder that does not exist are normalized to root.
pub struct TreeIndex<'a> {
    folder_list: &'a [Folder],
    template_list: &'a [Template],
    folders: HashMap<&'a str, &'a Folder>,
    templates: HashMap<&'a str, &'a Template>,
    root_folders: Vec<&'a Folder>,
    root_templates: Vec<&'a Template>,
    child_folders: HashMap<&'a str, Vec<&'a Folder>>,
    child_templates: HashMap<&'a str, Vec<&'a Template>>,
}

/// A node in the ordered directory tree
#[derive(Debug, Clone)]
pub enum TreeNode<'a> {
    Folder {
        folder: &'a Folder,
        depth: usize,
        children: Vec<TreeNode<'a>>,
    },
    Template {
        template: &'a Template,
        depth: usize,
    },
}

impl<'a> TreeIndex<'a> {
    pub fn new(folders: &'a [Folder], templates: &'a [Template]) -> Self {
        let folder_map: HashMap<&str, &Folder> =
            folders.iter().map(|f| (f.id.as_str(), f)).collect();
        let template_map: HashMap<&str, &Template> =
            templates.iter().map(|t| (t.id.as_str(), t)).collect();

        let resolve = |parent: Option<&'a str>| parent.filter(|p| folder_map.contains_key(p));

        let mut root_folders = Vec::new();
        let mut child_folders: HashMap<&str, Vec<&Folder>> = HashMap::new();
        for folder in folders {
            match resolve(folder.folder.as_deref()) {
                Some(parent) => child_folders.entry(parent).or_default().push(folder),
                None => root_folders.push(folder),
            }
        }
        let mut root_templates = Vec::new();
        let mut child_templates: HashMap<&str, Vec<&Template>> = HashMap::new();
        for template in templates {
            match resolve(template.folder.as_deref()) {
                Some(parent) => child_templates.entry(parent).or_default().push(template),
                None => root_templates.push(template),
            }
        }

        TreeIndex {
            folder_list: folders,
            template_list: templates,
            folders: folder_map,
            templates: template_map,
            root_folders,
            root_templates,
            child_folders,
            child_templates,
        }
    }

    /// All folders, in stored order
    pub fn folders(&self) -> std::slice::Iter<'a, Folder> {
        self.folder_list.iter()
    }

    /// All templates, in stored order
    pub fn templates(&self) -> std::slice::Iter<'a, Template> {
        self.template_list.iter()
    }

    pub fn folder(&self, id: &str) -> Option<&'a Folder> {
        self.folders.get(id).copied()
    }

    pub fn template(&self, id: &str) -> Option<&'a Template> {
        self.templates.get(id).copied()
    }

    /// Effective parent of a folder (dangling references resolve to root)
    pub fn folder_parent(&self, id: &str) -> Option<&'a str> {
        let folder = self.folder(id)?;
        folder
            .folder
            .as_deref()
            .and_then(|p| self.folders.get_key_value(p).map(|(k, _)| *k))
    }

    /// Effective parent of a template (dangling references resolve to root)
    pub fn template_parent(&self, id: &str) -> Option<&'a str> {
        let template = self.template(id)?;
        template
            .folder
            .as_deref()
            .and_then(|p| self.folders.get_key_value(p).map(|(k, _)| *k))
    }

    /// Folders directly under `parent` (`None` = root), in stored order
    pub fn child_folders(&self, parent: Option<&str>) -> &[&'a Folder] {
        match parent {
            None => &self.root_folders,
            Some(p) => self.child_folders.get(p).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Templates directly under `parent` (`None` = root), in stored order
    pub fn child_templates(&self, parent: Option<&str>) -> &[&'a Template] {
        match parent {
            None => &self.root_templates,
            Some(p) => self.child_templates.get(p).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Ancestor folder ids of `id`, nearest first. Stops at a cycle.
    pub fn ancestors(&self, id: &str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = self.folder_parent(id);
        while let Some(parent) = current {
            if parent == id || !seen.insert(parent) {
                break;
            }
            out.push(parent);
            current = self.folder_parent(parent);
        }
        out
    }

    /// Nesting depth of a folder: 1 for a root-level folder
    pub fn depth(&self, id: &str) -> usize {
        self.ancestors(id).len() + 1
    }

    /// Whether `candidate` lies strictly inside the subtree of `ancestor`
    pub fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        self.ancestors(candidate).iter().any(|a| *a == ancestor)
    }

    /// Whether following parent links from `id` leads back to `id`
    pub fn in_cycle(&self, id: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = self.folder_parent(id);
        while let Some(parent) = current {
            if parent == id {
                return true;
            }
            if !seen.insert(parent) {
                return false;
            }
            current = self.folder_parent(parent);
        }
        false
    }

    /// Every folder inside `id`, depth-first
    pub fn descendant_folders(&self, id: &str) -> Vec<&'a Folder> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![id];
        seen.insert(id);
        while let Some(current) = stack.pop() {
            for child in self.child_folders(Some(current)) {
                if seen.insert(child.id.as_str()) {
                    out.push(*child);
                    stack.push(child.id.as_str());
                }
            }
        }
        out
    }

    /// Levels of folders in the subtree rooted at `id` (1 for a leaf folder)
    pub fn subtree_height(&self, id: &str) -> usize {
        let base = self.depth(id);
        self.descendant_folders(id)
            .iter()
            .map(|f| self.depth(&f.id) - base + 1)
            .max()
            .unwrap_or(1)
    }

    /// Build the ordered directory tree. Within each level folders come
    /// first, then templates, each ordered by the containing folder's
    /// sorting mode (`root_sorting` at the top level).
    pub fn build_tree(&self, root_sorting: SortingMode) -> Vec<TreeNode<'a>> {
        let mut visited: HashSet<&str> = HashSet::new();
        self.build_level(None, root_sorting, 1, &mut visited)
    }

    fn build_level(
        &self,
        parent: Option<&'a str>,
        sorting: SortingMode,
        depth: usize,
        visited: &mut HashSet<&'a str>,
    ) -> Vec<TreeNode<'a>> {
        let mut folders: Vec<&Folder> = self.child_folders(parent).to_vec();
        sort_entries(&mut folders, sorting, |f| (&f.name, f.sort));
        let mut templates: Vec<&Template> = self.child_templates(parent).to_vec();
        sort_entries(&mut templates, sorting, |t| (&t.name, t.sort));

        let mut nodes = Vec::with_capacity(folders.len() + templates.len());
        for folder in folders {
            if !visited.insert(folder.id.as_str()) {
                continue;
            }
            let children = self.build_level(
                Some(folder.id.as_str()),
                folder.sorting,
                depth + 1,
                visited,
            );
            nodes.push(TreeNode::Folder {
                folder,
                depth,
                children,
            });
        }
        for template in templates {
            nodes.push(TreeNode::Template { template, depth });
        }
        nodes
    }
}

fn sort_entries<T>(entries: &mut [&T], sorting: SortingMode, key: impl Fn(&T) -> (&String, i64)) {
    match sorting {
        SortingMode::Manual => entries.sort_by_key(|e| key(*e).1),
        SortingMode::Alphabetical => {
            entries.sort_by(|a, b| compare_names(key(*a).0, key(*b).0))
        }
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl<'a> TreeNode<'a> {
    pub fn id(&self) -> &'a str {
        match *self {
            TreeNode::Folder { folder, .. } => &folder.id,
            TreeNode::Template { template, .. } => &template.id,
        }
    }

    /// Visit this node and everything below it, depth-first
    pub fn walk(&self, visit: &mut impl FnMut(&TreeNode<'a>)) {
        visit(self);
        if let TreeNode::Folder { children, .. } = self {
            for child in children {
                child.walk(visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn folder(id: &str, parent: Option<&str>, sort: i64) -> Folder {
        let mut f = Folder::new(id.to_string(), id.to_string());
        f.folder = parent.map(|p| p.to_string());
        f.sort = sort;
        f
    }

    fn template(id: &str, parent: Option<&str>, sort: i64) -> Template {
        let mut t = Template::new(id.to_string(), id.to_string());
        t.folder = parent.map(|p| p.to_string());
        t.sort = sort;
        t
    }

    fn sample() -> (Vec<Folder>, Vec<Template>) {
        let folders = vec![
            folder("F1", None, 200),
            folder("F2", Some("F1"), 100),
            folder("F3", Some("F2"), 100),
            folder("F0", None, 100),
        ];
        let templates = vec![
            template("T1", None, 20),
            template("T2", Some("F1"), 10),
            template("T3", Some("missing"), 10),
            template("T4", Some("F3"), 10),
        ];
        (folders, templates)
    }

    fn flatten(nodes: &[TreeNode]) -> Vec<(String, usize)> {
        let mut out = Vec::new();
        for node in nodes {
            node.walk(&mut |n| {
                let depth = match n {
                    TreeNode::Folder { depth, .. } | TreeNode::Template { depth, .. } => *depth,
                };
                out.push((n.id().to_string(), depth));
            });
        }
        out
    }

    #[test]
    fn depth_and_ancestors() {
        let (folders, templates) = sample();
        let index = TreeIndex::new(&folders, &templates);
        assert_eq!(index.depth("F1"), 1);
        assert_eq!(index.depth("F3"), 3);
        assert_eq!(index.ancestors("F3"), vec!["F2", "F1"]);
        assert!(index.is_descendant("F3", "F1"));
        assert!(!index.is_descendant("F1", "F3"));
        assert!(!index.is_descendant("F1", "F1"));
    }

    #[test]
    fn dangling_parent_is_root() {
        let (folders, templates) = sample();
        let index = TreeIndex::new(&folders, &templates);
        assert_eq!(index.template_parent("T3"), None);
        let root: Vec<&str> = index
            .child_templates(None)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(root, vec!["T1", "T3"]);
    }

    #[test]
    fn descendants_and_height() {
        let (folders, templates) = sample();
        let index = TreeIndex::new(&folders, &templates);
        let ids: Vec<&str> = index
            .descendant_folders("F1")
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ids, vec!["F2", "F3"]);
        assert_eq!(index.subtree_height("F1"), 3);
        assert_eq!(index.subtree_height("F3"), 1);
        assert_eq!(index.subtree_height("F0"), 1);
    }

    #[test]
    fn cycles_do_not_hang() {
        let folders = vec![folder("A", Some("B"), 0), folder("B", Some("A"), 0)];
        let index = TreeIndex::new(&folders, &[]);
        assert!(index.in_cycle("A"));
        assert_eq!(index.ancestors("A"), vec!["B"]);
        assert_eq!(index.depth("A"), 2);
        // nothing reachable from root
        assert!(index.build_tree(SortingMode::Manual).is_empty());
    }

    #[test]
    fn tree_orders_folders_first_by_key() {
        let (folders, templates) = sample();
        let index = TreeIndex::new(&folders, &templates);
        let tree = index.build_tree(SortingMode::Manual);
        assert_eq!(
            flatten(&tree),
            vec![
                ("F0".to_string(), 1),
                ("F1".to_string(), 1),
                ("F2".to_string(), 2),
                ("F3".to_string(), 3),
                ("T4".to_string(), 4),
                ("T2".to_string(), 2),
                ("T3".to_string(), 1),
                ("T1".to_string(), 1),
            ]
        );
    }

    #[test]
    fn alphabetical_folder_sorts_by_name() {
        let mut parent = folder("P", None, 0);
        parent.sorting = SortingMode::Alphabetical;
        let folders = vec![parent];
        let mut a = template("a", Some("P"), 30);
        a.name = "banner".into();
        let mut b = template("b", Some("P"), 10);
        b.name = "Wall".into();
        let mut c = template("c", Some("P"), 20);
        c.name = "Altar".into();
        let templates = vec![a, b, c];

        let index = TreeIndex::new(&folders, &templates);
        let tree = index.build_tree(SortingMode::Manual);
        let ids: Vec<String> = flatten(&tree).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["P", "c", "a", "b"]);
    }
}
