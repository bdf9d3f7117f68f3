use std::collections::HashSet;
use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::model::item::ItemKind;
use crate::ops::tree::TreeIndex;

/// A directory entry whose name matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: ItemKind,
    pub id: String,
    /// Byte ranges of the matches within the name
    pub spans: Vec<Range<usize>>,
}

/// Outcome of filtering the directory by name
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
    /// Folders to show (and show expanded)
    pub folders: HashSet<String>,
    /// Templates to show
    pub templates: HashSet<String>,
}

impl SearchResult {
    pub fn shows_folder(&self, id: &str) -> bool {
        self.folders.contains(id)
    }

    pub fn shows_template(&self, id: &str) -> bool {
        self.templates.contains(id)
    }
}

/// Compile a case-insensitive name filter
pub fn build_search_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Filter the directory by name. A matching template is shown inside its
/// ancestor folders. A matching folder is shown with its ancestors and its
/// whole subtree.
pub fn search(index: &TreeIndex<'_>, re: &Regex) -> SearchResult {
    let mut result = SearchResult::default();
    // Matched folders and everything beneath them
    let mut subtrees: HashSet<String> = HashSet::new();

    for folder in index.folders() {
        let spans = find_matches(re, &folder.name);
        if spans.is_empty() {
            continue;
        }
        result.hits.push(SearchHit {
            kind: ItemKind::Folder,
            id: folder.id.clone(),
            spans,
        });
        subtrees.insert(folder.id.clone());
        for inner in index.descendant_folders(&folder.id) {
            subtrees.insert(inner.id.clone());
        }
        reveal_ancestors(index, &folder.id, &mut result.folders);
    }
    result.folders.extend(subtrees.iter().cloned());

    for template in index.templates() {
        let spans = find_matches(re, &template.name);
        let parent = index.template_parent(&template.id);
        let inherited = parent.is_some_and(|p| subtrees.contains(p));
        if spans.is_empty() && !inherited {
            continue;
        }
        if !spans.is_empty() {
            result.hits.push(SearchHit {
                kind: ItemKind::Template,
                id: template.id.clone(),
                spans,
            });
        }
        result.templates.insert(template.id.clone());
        if let Some(p) = parent {
            result.folders.insert(p.to_string());
            reveal_ancestors(index, p, &mut result.folders);
        }
    }

    result
}

fn reveal_ancestors(index: &TreeIndex<'_>, id: &str, visible: &mut HashSet<String>) {
    for ancestor in index.ancestors(id) {
        visible.insert(ancestor.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{Folder, Template};
    use pretty_assertions::assert_eq;

    fn folder(id: &str, name: &str, parent: Option<&str>) -> Folder {
        let mut f = Folder::new(id.into(), name.into());
        f.folder = parent.map(String::from);
        f
    }

    fn template(id: &str, name: &str, parent: Option<&str>) -> Template {
        let mut t = Template::new(id.into(), name.into());
        t.folder = parent.map(String::from);
        t
    }

    /// Dungeon > Doors > {Iron Door, Wooden Door}; Dungeon > Traps > Pit;
    /// Forest > Tree; Chest at root
    fn library() -> (Vec<Folder>, Vec<Template>) {
        (
            vec![
                folder("dun", "Dungeon", None),
                folder("doors", "Doors", Some("dun")),
                folder("traps", "Traps", Some("dun")),
                folder("forest", "Forest", None),
            ],
            vec![
                template("iron", "Iron Door", Some("doors")),
                template("wood", "Wooden Door", Some("doors")),
                template("pit", "Pit", Some("traps")),
                template("tree", "Tree", Some("forest")),
                template("chest", "Chest", None),
            ],
        )
    }

    fn sorted(set: &HashSet<String>) -> Vec<&str> {
        let mut v: Vec<&str> = set.iter().map(String::as_str).collect();
        v.sort();
        v
    }

    #[test]
    fn template_match_reveals_ancestors() {
        let (folders, templates) = library();
        let index = TreeIndex::new(&folders, &templates);
        let result = search(&index, &build_search_regex("iron").unwrap());
        assert_eq!(sorted(&result.templates), vec!["iron"]);
        assert_eq!(sorted(&result.folders), vec!["doors", "dun"]);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].spans, vec![0..4]);
    }

    #[test]
    fn folder_match_reveals_subtree() {
        let (folders, templates) = library();
        let index = TreeIndex::new(&folders, &templates);
        let result = search(&index, &build_search_regex("^dungeon$").unwrap());
        assert_eq!(sorted(&result.folders), vec!["doors", "dun", "traps"]);
        assert_eq!(sorted(&result.templates), vec!["iron", "pit", "wood"]);
        assert!(!result.shows_template("chest"));
        assert!(!result.shows_folder("forest"));
    }

    #[test]
    fn case_insensitive_and_regex() {
        let (folders, templates) = library();
        let index = TreeIndex::new(&folders, &templates);
        let result = search(&index, &build_search_regex("DOOR$").unwrap());
        assert_eq!(sorted(&result.templates), vec!["iron", "wood"]);
        let hit_ids: Vec<&str> = result.hits.iter().map(|h| h.id.as_str()).collect();
        assert!(!hit_ids.contains(&"doors"));
    }

    #[test]
    fn root_template_match() {
        let (folders, templates) = library();
        let index = TreeIndex::new(&folders, &templates);
        let result = search(&index, &build_search_regex("chest").unwrap());
        assert_eq!(sorted(&result.templates), vec!["chest"]);
        assert!(result.folders.is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(build_search_regex("(unclosed").is_err());
    }
}
