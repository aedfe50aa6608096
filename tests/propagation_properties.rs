//! Property tests over random dependency graphs, cycles included.

use std::collections::{HashSet, VecDeque};

use proptest::prelude::*;
use taskchain::model::{Dependency, Status, Task};
use taskchain::propagate::{ConflictPolicy, Propagator, compute_ancestor_updates};

fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Todo),
        Just(Status::InProgress),
        Just(Status::Done),
        Just(Status::Blocked),
    ]
}

/// Up to 30 tasks with ids 1..=n; each edge list may point anywhere,
/// including at the task itself.
fn graph_strategy() -> impl Strategy<Value = Vec<Task>> {
    (1usize..30).prop_flat_map(|n| {
        prop::collection::vec(
            (
                status_strategy(),
                prop::collection::vec(1..=n as u64, 0..4),
            ),
            n,
        )
        .prop_map(|rows| {
            let statuses: Vec<Status> = rows.iter().map(|(s, _)| *s).collect();
            rows.iter()
                .enumerate()
                .map(|(i, (status, deps))| Task {
                    id: i as u64 + 1,
                    title: format!("Task {}", i + 1),
                    description: String::new(),
                    status: *status,
                    dependencies: deps
                        .iter()
                        .map(|&d| Dependency {
                            id: d,
                            title: format!("Task {d}"),
                            description: String::new(),
                            status: statuses[d as usize - 1],
                        })
                        .collect(),
                })
                .collect()
        })
    })
}

fn ancestors(tasks: &[Task], root: u64) -> HashSet<u64> {
    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        for task in tasks.iter().filter(|t| t.depends_on(id)) {
            if seen.insert(task.id) {
                queue.push_back(task.id);
            }
        }
    }
    seen.remove(&root);
    seen
}

proptest! {
    #[test]
    fn output_is_exactly_the_ancestor_set(
        tasks in graph_strategy(),
        pick in any::<prop::sample::Index>(),
        status in status_strategy(),
    ) {
        let root = tasks[pick.index(tasks.len())].with_status(status);
        let updates = compute_ancestor_updates(&tasks, &root, &mut HashSet::new());

        let reported: HashSet<u64> = updates.iter().map(|u| u.id).collect();
        prop_assert_eq!(reported.len(), updates.len());
        prop_assert!(!reported.contains(&root.id));
        prop_assert_eq!(reported, ancestors(&tasks, root.id));
    }

    #[test]
    fn only_todo_or_blocked_is_emitted(
        tasks in graph_strategy(),
        pick in any::<prop::sample::Index>(),
        status in status_strategy(),
    ) {
        let root = tasks[pick.index(tasks.len())].with_status(status);
        let updates = compute_ancestor_updates(&tasks, &root, &mut HashSet::new());
        prop_assert!(updates
            .iter()
            .all(|u| matches!(u.status, Status::Todo | Status::Blocked)));
    }

    #[test]
    fn indirect_ancestors_are_always_blocked(
        tasks in graph_strategy(),
        pick in any::<prop::sample::Index>(),
        status in status_strategy(),
    ) {
        let root = tasks[pick.index(tasks.len())].with_status(status);
        let updates = compute_ancestor_updates(&tasks, &root, &mut HashSet::new());
        for update in updates {
            let direct = tasks.iter().any(|t| t.id == update.id && t.depends_on(root.id));
            if !direct {
                prop_assert_eq!(update.status, Status::Blocked);
            }
        }
    }

    #[test]
    fn repeated_calls_agree_and_policies_coincide(
        tasks in graph_strategy(),
        pick in any::<prop::sample::Index>(),
        status in status_strategy(),
    ) {
        let root = tasks[pick.index(tasks.len())].with_status(status);
        let first = compute_ancestor_updates(&tasks, &root, &mut HashSet::new());
        let second = compute_ancestor_updates(&tasks, &root, &mut HashSet::new());
        prop_assert_eq!(&first, &second);

        let blocked_wins = Propagator::new(ConflictPolicy::BlockedWins)
            .ancestor_updates(&tasks, &root, &mut HashSet::new());
        prop_assert_eq!(first, blocked_wins);
    }
}
