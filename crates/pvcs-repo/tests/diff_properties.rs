use proptest::prelude::*;
use pvcs_repo::{line_diff, split_lines, ChangeSet, FileStates, LineChange};
use pvcs_storage::{ObjectId, ObjectType};
use std::collections::BTreeSet;

fn file_states() -> impl Strategy<Value = FileStates> {
    prop::collection::btree_map("[a-d]{1,2}", 0u8..3, 0..8).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(path, content)| (path, ObjectId::hash_object(ObjectType::Blob, &[content])))
            .collect()
    })
}

proptest! {
    #[test]
    fn change_sets_partition_the_differing_paths(old in file_states(), new in file_states()) {
        let changes = ChangeSet::compare(&old, &new);

        for set in [&changes.added, &changes.removed, &changes.modified] {
            prop_assert!(set.windows(2).all(|w| w[0] < w[1]));
        }

        let added: BTreeSet<_> = changes.added.iter().collect();
        let removed: BTreeSet<_> = changes.removed.iter().collect();
        let modified: BTreeSet<_> = changes.modified.iter().collect();
        prop_assert!(added.is_disjoint(&removed));
        prop_assert!(added.is_disjoint(&modified));
        prop_assert!(removed.is_disjoint(&modified));

        let all: BTreeSet<_> = old.keys().chain(new.keys()).collect();
        for path in all {
            let changed = added.contains(path) || removed.contains(path) || modified.contains(path);
            prop_assert_eq!(changed, old.get(path) != new.get(path));
        }
    }

    #[test]
    fn comparing_a_state_with_itself_is_empty(states in file_states()) {
        prop_assert!(ChangeSet::compare(&states, &states).is_empty());
    }

    #[test]
    fn line_diff_counts_match_line_totals(
        old in prop::collection::vec("[a-c]{0,2}", 0..6),
        new in prop::collection::vec("[a-c]{0,2}", 0..6),
    ) {
        let old_text = old.join("\n");
        let new_text = new.join("\n");
        let changes = line_diff(&old_text, &new_text);
        let added: Vec<_> = changes
            .iter()
            .filter_map(|c| match c {
                LineChange::Added(line) => Some(line.clone()),
                LineChange::Removed(_) => None,
            })
            .collect();
        let removed = changes.iter().filter(|c| matches!(c, LineChange::Removed(_))).count();

        let old_lines = split_lines(&old_text);
        let new_lines = split_lines(&new_text);
        let kept = old_lines
            .iter()
            .zip(new_lines.iter())
            .filter(|(a, b)| a == b)
            .count();
        prop_assert_eq!(kept + added.len(), new_lines.len());
        prop_assert_eq!(kept + removed, old_lines.len());
    }
}
