//! Bounded field summary for `this`-capture diagnostics.
//!
//! Capturing `this` silently aliases every field of the object and its
//! whole base chain for the closure's lifetime. The summary makes that
//! blast radius legible without flooding output for deep hierarchies.

use std::collections::{HashSet, VecDeque};

use crate::ast::{Access, ClassId, TranslationUnit};

/// Most field names rendered before the list is cut off.
const FIELD_PREVIEW_CAP: usize = 3;

/// Render `Name {f1, f2, f3, ...}` for a class and its inheritance chain.
///
/// Breadth-first from the class itself: own fields are eligible at any
/// access level, base fields only when non-private. Once the counter
/// reaches the cap a class's bases stop being enqueued, but branches
/// already pending still drain; the ellipsis is appended exactly once,
/// when the fourth eligible field turns up.
pub fn summarize_class(unit: &TranslationUnit, root: ClassId) -> String {
    let mut names: Vec<&str> = Vec::new();
    let mut eligible = 0usize;
    let mut truncated = false;

    let mut queue = VecDeque::from([root]);
    let mut seen: HashSet<ClassId> = HashSet::from([root]);

    while let Some(id) = queue.pop_front() {
        let class = unit.class(id);
        for field in &class.fields {
            if id != root && field.access == Access::Private {
                continue;
            }
            eligible += 1;
            if eligible <= FIELD_PREVIEW_CAP {
                names.push(&field.name);
            } else if eligible == FIELD_PREVIEW_CAP + 1 {
                truncated = true;
            }
        }
        if eligible < FIELD_PREVIEW_CAP {
            for &base in &class.bases {
                if seen.insert(base) {
                    queue.push_back(base);
                }
            }
        }
    }

    if truncated {
        names.push("...");
    }
    format!("{} {{{}}}", unit.class(root).name, names.join(", "))
}
