//! Property tests for the task display order.
//!
//! Uses proptest to verify, for arbitrary creation and completion
//! sequences:
//! 1. The view is a permutation of every task in the store.
//! 2. An incomplete active task is listed first.
//! 3. Other incomplete tasks keep insertion order.
//! 4. Completed tasks follow, in the order they were completed.
//! 5. Completion is permanent and reported once.

#![allow(clippy::unwrap_used)]

use flowcus::tasks::TaskStore;
use flowcus_proto::task::TaskId;
use flowcus_proto::track::Track;
use proptest::prelude::*;

fn track(i: usize) -> Track {
    Track {
        uri: format!("spotify:track:{i}"),
        name: format!("Song {i}"),
        artists_display_name: "Artist".to_string(),
        duration_ms: 200_000,
        image: String::new(),
    }
}

/// A store with `count` tasks plus their ids in insertion order.
fn store_with(count: usize) -> (TaskStore, Vec<TaskId>) {
    let mut store = TaskStore::new();
    let ids = (0..count)
        .map(|i| {
            store
                .create_task(&format!("task {i}"), None, track(i))
                .map(|t| t.id)
                .unwrap()
        })
        .collect();
    (store, ids)
}

proptest! {
    #[test]
    fn view_orders_active_then_pending_then_completed(
        count in 1usize..12,
        completions in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
        active in proptest::option::of(any::<prop::sample::Index>()),
    ) {
        let (mut store, ids) = store_with(count);

        let mut completed_order = Vec::new();
        for pick in &completions {
            let id = &ids[pick.index(count)];
            let newly = store.complete_task(id);
            prop_assert_eq!(newly, !completed_order.contains(id));
            if newly {
                completed_order.push(id.clone());
            }
        }
        let active = active.map(|pick| ids[pick.index(count)].clone());

        let view: Vec<TaskId> = store.view(active.as_ref()).iter().map(|t| t.id.clone()).collect();

        // Permutation of all tasks.
        prop_assert_eq!(view.len(), count);
        for id in &ids {
            prop_assert_eq!(view.iter().filter(|v| *v == id).count(), 1);
        }

        let active_pending = active.filter(|id| !completed_order.contains(id));
        let mut expected: Vec<TaskId> = active_pending.iter().cloned().collect();
        expected.extend(
            ids.iter()
                .filter(|id| !completed_order.contains(id) && Some(*id) != active_pending.as_ref())
                .cloned(),
        );
        expected.extend(completed_order.iter().cloned());
        prop_assert_eq!(view, expected);

        // Completion sticks.
        for id in &completed_order {
            prop_assert!(store.get(id).unwrap().completed);
            prop_assert!(!store.complete_task(id));
        }
    }

    #[test]
    fn blank_names_never_create_tasks(name in "[ \t\n]{0,8}") {
        let mut store = TaskStore::new();
        prop_assert!(store.create_task(&name, None, track(0)).is_err());
        prop_assert!(store.is_empty());
    }
}
