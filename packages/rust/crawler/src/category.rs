//! Path-containment categorization.

use docmesh_shared::{CategoryMatching, CategoryRule, UNCATEGORIZED};

/// Pick the category label for a file whose resolved path is `real_path`.
///
/// Both the path and every rule path are compared in forward-slash form.
pub fn categorize(real_path: &str, rules: &[CategoryRule], mode: CategoryMatching) -> String {
    let real_path = real_path.replace('\\', "/");
    let contains = |rule: &CategoryRule| real_path.contains(&rule.path.replace('\\', "/"));

    match mode {
        CategoryMatching::LastRule => {
            let mut label = UNCATEGORIZED;
            for rule in rules {
                label = if contains(rule) {
                    rule.name.as_str()
                } else {
                    UNCATEGORIZED
                };
            }
            label.to_string()
        }
        CategoryMatching::FirstMatch => rules
            .iter()
            .find(|&rule| contains(rule))
            .map_or(UNCATEGORIZED, |rule| rule.name.as_str())
            .to_string(),
    }
}
