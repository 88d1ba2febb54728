//! Display-name resolution.
//!
//! A file's display name starts as its basename, runs through the
//! repository's rule chain and then the global chain, gets the index-file
//! rename, and finally loses its `.md` suffix.

use docmesh_shared::{INDEX_FILE_NAME, MARKDOWN_EXTENSION, NameMappingRule};

/// Run `name` through `rules` in order, each rule seeing the previous output.
pub fn apply_rules(name: &str, rules: &[NameMappingRule]) -> String {
    rules
        .iter()
        .fold(name.to_string(), |current, rule| rule.apply(&current))
}

/// Resolve the display name of a file.
///
/// `parent` is the final segment of the file's parent directory relative to
/// the repository root, `None` for files directly at the root.
pub fn resolve_display_name(
    basename: &str,
    parent: Option<&str>,
    repo_rules: &[NameMappingRule],
    global_rules: &[NameMappingRule],
) -> String {
    let mut name = apply_rules(basename, repo_rules);
    name = apply_rules(&name, global_rules);

    if name == INDEX_FILE_NAME {
        if let Some(parent) = parent {
            name = parent.to_string();
        }
    }

    match name.strip_suffix(MARKDOWN_EXTENSION) {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}
