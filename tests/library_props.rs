//! Property-based tests for library ordering and persistence
//!
//! Run with: cargo test --test library_props

use duocam::library::{FileKeyValueStore, LibraryStore};
use duocam::testing::synthetic_recording;
use duocam::timing::{RecordingClock, MAX_RECORDING_DURATION};
use proptest::prelude::*;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Op {
    Append,
    Remove(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Append),
        1 => (0usize..8).prop_map(Op::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// INVARIANT: the library is newest-first and survives a reload unchanged
    #[test]
    fn library_matches_model_after_reload(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("store");
        let mut library = LibraryStore::new(FileKeyValueStore::open(&store_dir).unwrap(), "videos");
        library.load();

        // Newest first, like the library itself.
        let mut model: Vec<Uuid> = Vec::new();
        for (n, op) in ops.iter().enumerate() {
            match op {
                Op::Append => {
                    let video = synthetic_recording(dir.path(), &format!("clip{}", n), 16).unwrap();
                    model.insert(0, video.id);
                    library.append(video).unwrap();
                }
                Op::Remove(index) => {
                    if *index < model.len() {
                        model.remove(*index);
                    }
                    library.remove_at(&[*index]).unwrap();
                }
            }
            let ids: Vec<Uuid> = library.videos().iter().map(|v| v.id).collect();
            prop_assert_eq!(&ids, &model);
        }

        let mut reopened = LibraryStore::new(FileKeyValueStore::open(&store_dir).unwrap(), "videos");
        let ids: Vec<Uuid> = reopened.load().iter().map(|v| v.id).collect();
        prop_assert_eq!(ids, model);
    }

    /// INVARIANT: the clock never passes the ceiling and only stops growing there
    #[test]
    fn clock_is_monotonic_and_capped(ticks in 0u32..400) {
        let mut clock = RecordingClock::new();
        let mut last = clock.elapsed();
        for _ in 0..ticks {
            let was_exhausted = clock.is_exhausted();
            let now = clock.advance();
            prop_assert!(now <= MAX_RECORDING_DURATION);
            if was_exhausted {
                prop_assert_eq!(now, last);
            } else {
                prop_assert!(now > last);
            }
            last = now;
        }
        prop_assert_eq!(clock.is_exhausted(), ticks >= 150);
    }
}
