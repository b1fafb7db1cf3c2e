//! Tag ancestry walking and full-path construction.
//!
//! Tags are an id-indexed arena with weak `parent_id` back-references, not
//! an owned tree. Path walks are guarded by a visited set and bounded by
//! the arena size, so a corrupted parent chain surfaces as
//! [`SnipError::Consistency`] instead of a hang.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, SnipError};
use crate::models::TagRow;

pub const PATH_SEPARATOR: &str = " > ";

/// Full root-to-tag path for every row in `rows`, in input order. The walk
/// for each tag is bounded by `rows.len()` steps.
pub fn full_paths(rows: &[TagRow]) -> Result<Vec<String>> {
    let arena: HashMap<i64, &TagRow> = rows.iter().map(|row| (row.id, row)).collect();
    rows.iter().map(|row| full_path(&arena, row, rows.len())).collect()
}

fn full_path(arena: &HashMap<i64, &TagRow>, row: &TagRow, bound: usize) -> Result<String> {
    let mut names = vec![row.name.as_str()];
    let mut visited = HashSet::from([row.id]);
    let mut current = row.parent_id;
    let mut steps = 0usize;

    while let Some(parent_id) = current {
        steps += 1;
        if steps > bound {
            return Err(SnipError::Consistency(format!(
                "tag {} ancestor chain exceeds tag count {bound}",
                row.id
            )));
        }
        if !visited.insert(parent_id) {
            return Err(SnipError::Consistency(format!(
                "tag ancestry cycle through id {parent_id}"
            )));
        }
        // A dangling parent_id ends the chain; the referenced row may live
        // in the other store.
        let Some(parent) = arena.get(&parent_id) else {
            break;
        };
        names.push(parent.name.as_str());
        current = parent.parent_id;
    }

    names.reverse();
    Ok(names.join(PATH_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::TagType;

    fn row(id: i64, name: &str, parent_id: Option<i64>) -> TagRow {
        TagRow {
            id,
            name: name.to_string(),
            parent_id,
            tag_type: TagType::Folder,
            icon: "📁".to_string(),
            color: "#64B5F6".to_string(),
            description: None,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn root_tag_path_is_its_own_name() {
        let rows = vec![row(1, "Python", None)];
        assert_eq!(full_paths(&rows).expect("paths"), vec!["Python"]);
    }

    #[test]
    fn nested_path_joins_ancestors_root_first() {
        let rows = vec![
            row(1, "Python", None),
            row(2, "Web", Some(1)),
            row(3, "Django", Some(2)),
        ];
        let paths = full_paths(&rows).expect("paths");
        assert_eq!(paths, vec!["Python", "Python > Web", "Python > Web > Django"]);
    }

    #[test]
    fn sibling_order_does_not_affect_paths() {
        let rows = vec![row(3, "Django", Some(1)), row(1, "Python", None)];
        let paths = full_paths(&rows).expect("paths");
        assert_eq!(paths, vec!["Python > Django", "Python"]);
    }

    #[test]
    fn cycle_raises_consistency_error() {
        let rows = vec![row(1, "A", Some(2)), row(2, "B", Some(1))];
        let err = full_paths(&rows).expect_err("cycle must fail");
        assert_eq!(err.code(), "CONSISTENCY_VIOLATION");
    }

    #[test]
    fn self_parent_raises_consistency_error() {
        let rows = vec![row(1, "A", Some(1))];
        let err = full_paths(&rows).expect_err("self-cycle must fail");
        assert_eq!(err.code(), "CONSISTENCY_VIOLATION");
    }

    #[test]
    fn dangling_parent_ends_the_chain() {
        let rows = vec![row(5, "Orphan", Some(99))];
        assert_eq!(full_paths(&rows).expect("paths"), vec!["Orphan"]);
    }
}
