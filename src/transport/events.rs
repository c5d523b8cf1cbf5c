//! Push events produced by a receive-pack execution.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a ref update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushEventKind {
    /// A new branch ref was created.
    Create,
    /// An existing ref moved.
    Update,
    /// A ref was deleted.
    Delete,
    /// A tag ref was pushed.
    Tag,
}

impl fmt::Display for PushEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PushEventKind::Create => "create",
            PushEventKind::Update => "update",
            PushEventKind::Delete => "delete",
            PushEventKind::Tag => "tag",
        };
        f.write_str(s)
    }
}

/// One ref-update record from a push, in the order git produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Full ref name, e.g. `refs/heads/main`.
    pub ref_name: String,
    /// Object id the ref pointed at before the push.
    pub old: String,
    /// Object id the ref points at after the push.
    pub new: String,
    /// What the update did.
    pub kind: PushEventKind,
}

/// Collapse runs of identical adjacent events, keeping the first of each
/// run. Non-adjacent duplicates are preserved: `[A, A, B, B, A]` becomes
/// `[A, B, A]`.
pub fn collapse_duplicate_events(events: Vec<PushEvent>) -> Vec<PushEvent> {
    let mut collapsed: Vec<PushEvent> = Vec::with_capacity(events.len());
    for event in events {
        if collapsed.last() != Some(&event) {
            collapsed.push(event);
        }
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(ref_name: &str) -> PushEvent {
        PushEvent {
            ref_name: ref_name.to_string(),
            old: "a".repeat(40),
            new: "b".repeat(40),
            kind: PushEventKind::Update,
        }
    }

    #[test]
    fn adjacent_duplicates_collapse_non_adjacent_survive() {
        let a = event("refs/heads/a");
        let b = event("refs/heads/b");
        let collapsed = collapse_duplicate_events(vec![
            a.clone(),
            a.clone(),
            b.clone(),
            b.clone(),
            a.clone(),
        ]);
        assert_eq!(collapsed, vec![a, b, event("refs/heads/a")]);
    }

    #[test]
    fn empty_and_singleton_pass_through() {
        assert!(collapse_duplicate_events(Vec::new()).is_empty());
        let a = event("refs/heads/a");
        assert_eq!(collapse_duplicate_events(vec![a.clone()]), vec![a]);
    }

    #[test]
    fn distinct_events_are_untouched() {
        let a = event("refs/heads/a");
        let b = event("refs/heads/b");
        let c = event("refs/heads/c");
        let input = vec![a, b, c];
        assert_eq!(collapse_duplicate_events(input.clone()), input);
    }
}
