use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use speculate2::speculate;
use worry_tree::models::{MonsterColor, Position, Worry, WorryId, WorryState, MONSTER_COLORS};
use worry_tree::store::{StoreError, WorryStore};

fn worry(id: u64, text: &str) -> Worry {
    Worry {
        id: WorryId(id),
        text: text.to_string(),
        position: Position::new(20.0, 30.0, 5.0),
        color: MonsterColor::new("#ff7b7b"),
        state: WorryState::Pending,
    }
}

speculate! {
    before {
        let mut store = WorryStore::new();
        let mut rng = StdRng::seed_from_u64(7);
    }

    describe "add" {
        it "appends one pending worry with a fresh id" {
            let first = store.add("exam", &mut rng).expect("Failed to add");
            let second = store.add("rent", &mut rng).expect("Failed to add");

            assert_eq!(store.len(), 2);
            assert_ne!(first, second);
            let added = store.get(second).expect("Worry missing");
            assert_eq!(added.text, "rent");
            assert!(added.is_pending());
        }

        it "stores the text trimmed" {
            let id = store.add("  exam  ", &mut rng).expect("Failed to add");
            assert_eq!(store.get(id).unwrap().text, "exam");
        }

        it "ignores blank text" {
            assert_eq!(store.add("", &mut rng), Err(StoreError::BlankText));
            assert_eq!(store.add("   ", &mut rng), Err(StoreError::BlankText));
            assert!(store.is_empty());
        }

        it "keeps ids unique and increasing within one millisecond" {
            let ids: Vec<WorryId> = (0..50)
                .map(|i| store.add(&format!("worry {}", i), &mut rng).unwrap())
                .collect();

            let unique: HashSet<_> = ids.iter().collect();
            assert_eq!(unique.len(), 50);
            assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        }

        it "picks a palette color and a position on the branches" {
            let id = store.add("exam", &mut rng).unwrap();
            let added = store.get(id).unwrap();

            assert!(MONSTER_COLORS.contains(&added.color.as_str()));
            assert!(Position::TOP_RANGE.contains(&added.position.top));
            assert!(Position::LEFT_RANGE.contains(&added.position.left));
            assert!(Position::ROTATION_RANGE.contains(&added.position.rotation));
        }
    }

    describe "remove" {
        it "returns the removed worry" {
            let id = store.add("exam", &mut rng).unwrap();
            let removed = store.remove(id).expect("Nothing removed");
            assert_eq!(removed.text, "exam");
            assert!(store.is_empty());
        }

        it "returns None for an unknown id" {
            assert!(store.remove(WorryId(42)).is_none());
        }

        it "never hands out a removed id again" {
            let id = store.add("exam", &mut rng).unwrap();
            store.remove(id);
            let next = store.add("rent", &mut rng).unwrap();
            assert!(next > id);
        }
    }

    describe "restore" {
        it "keeps ids above everything seen so far" {
            assert_eq!(store.restore(worry(1, "exam")), WorryId(1));
            assert_eq!(store.restore(worry(5, "rent")), WorryId(5));
        }

        it "reassigns duplicate or stale ids" {
            store.restore(worry(5, "exam"));
            assert_eq!(store.restore(worry(5, "rent")), WorryId(6));
            assert_eq!(store.restore(worry(2, "job")), WorryId(7));
        }

        it "preserves order" {
            let restored: WorryStore = vec![worry(3, "a"), worry(1, "b"), worry(2, "c")]
                .into_iter()
                .collect();
            let texts: Vec<_> = restored.iter().map(|w| w.text.as_str()).collect();
            assert_eq!(texts, vec!["a", "b", "c"]);
        }
    }

    describe "pending" {
        it "skips falling worries" {
            let a = store.add("exam", &mut rng).unwrap();
            store.add("rent", &mut rng).unwrap();
            store.get_mut(a).unwrap().state = WorryState::Falling {
                comfort_text: "you prepared".to_string(),
            };

            let pending: Vec<_> = store.pending().map(|w| w.text.as_str()).collect();
            assert_eq!(pending, vec!["rent"]);
        }
    }
}
