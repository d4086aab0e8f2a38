use m209_analyzer::attack::{BestList, PushOutcome};
use proptest::prelude::*;
use rstest::rstest;
use std::sync::Arc;
use std::thread;

fn dec(s: &str) -> Vec<u8> {
    s.bytes().map(|b| b - b'A').collect()
}

fn scores<K: Clone>(list: &BestList<K>) -> Vec<f64> {
    list.get_top(list.capacity()).iter().map(|e| e.score).collect()
}

#[test]
fn capacity_three_keeps_the_three_best() {
    let list = BestList::new(3, false, None);
    list.push_result(10.0, "k1", dec("AA"));
    list.push_result(20.0, "k2", dec("BB"));
    list.push_result(5.0, "k3", dec("CC"));
    list.push_result(15.0, "k4", dec("DD"));

    let top = list.get_top(3);
    let got: Vec<(f64, Vec<u8>)> = top.iter().map(|e| (e.score, e.decryption.clone())).collect();
    assert_eq!(
        got,
        vec![(20.0, dec("BB")), (15.0, dec("DD")), (10.0, dec("AA"))]
    );
    assert!(top.iter().all(|e| e.decryption != dec("CC")));
}

#[rstest]
#[case(4.0, false)]
#[case(10.0, false)]
#[case(10.5, true)]
fn push_against_full_list(#[case] score: f64, #[case] accepted: bool) {
    let list = BestList::new(3, false, None);
    list.push_result(10.0, 1, dec("AA"));
    list.push_result(20.0, 2, dec("BB"));
    list.push_result(15.0, 3, dec("DD"));
    let before = list.get_top(3);

    let outcome = list.push_result(score, 4, dec("EE"));
    assert_eq!(outcome.accepted(), accepted);
    if !accepted {
        assert_eq!(outcome, PushOutcome::Rejected);
        assert_eq!(list.get_top(3), before);
    } else {
        assert_eq!(scores(&list), vec![20.0, 15.0, 10.5]);
    }
}

#[rstest]
#[case(5.0, PushOutcome::Duplicate, 10.0)]
#[case(10.0, PushOutcome::Duplicate, 10.0)]
#[case(12.0, PushOutcome::Replaced { rank: 0, notified: true }, 12.0)]
fn dedup_keeps_one_entry_per_plaintext(
    #[case] second: f64,
    #[case] expected: PushOutcome,
    #[case] kept: f64,
) {
    let list = BestList::new(5, true, None);
    list.push_result(10.0, "first", dec("HELLO"));
    assert_eq!(list.push_result(second, "second", dec("HELLO")), expected);
    assert_eq!(list.len(), 1);
    assert_eq!(list.best_score(), Some(kept));
}

#[test]
fn without_dedup_identical_plaintexts_coexist() {
    let list = BestList::new(5, false, None);
    list.push_result(10.0, (), dec("SAME"));
    list.push_result(11.0, (), dec("SAME"));
    assert_eq!(list.len(), 2);
}

#[test]
fn equal_scores_keep_discovery_order() {
    let list = BestList::new(3, false, None);
    list.push_result(7.0, "first", dec("A"));
    list.push_result(7.0, "second", dec("B"));
    let outcome = list.push_result(7.0, "third", dec("C"));
    assert_eq!(
        outcome,
        PushOutcome::Inserted {
            rank: 2,
            notified: true
        }
    );
    let keys: Vec<&str> = list.get_top(3).iter().map(|e| e.key).collect();
    assert_eq!(keys, vec!["first", "second", "third"]);

    // A tie with the worst of a full list does not evict it.
    assert_eq!(list.push_result(7.0, "fourth", dec("D")), PushOutcome::Rejected);
}

#[test]
fn get_top_is_a_snapshot() {
    let list = BestList::new(3, false, None);
    list.push_result(1.0, (), dec("A"));
    let snapshot = list.get_top(5);
    list.push_result(2.0, (), dec("B"));
    assert_eq!(snapshot.len(), 1);
    assert_eq!(list.get_top(1)[0].score, 2.0);
}

#[test]
fn clear_empties_the_list() {
    let list = BestList::new(3, false, None);
    list.push_result(1.0, (), dec("A"));
    list.clear();
    assert!(list.is_empty());
    assert_eq!(list.best_score(), None);
}

#[test]
fn concurrent_pushes_lose_nothing() {
    const THREADS: usize = 8;
    const PUSHES: usize = 1000;
    const CAPACITY: usize = 100;

    let list = Arc::new(BestList::new(CAPACITY, false, None));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                let mut rng = fastrand::Rng::with_seed(t as u64);
                let mut pushed = Vec::with_capacity(PUSHES);
                for i in 0..PUSHES {
                    // Unique scores so the expected top set is unambiguous.
                    let score = rng.f64() * 1e6 + (t * PUSHES + i) as f64 * 1e-3;
                    list.push_result(score, (t, i), vec![t as u8, (i % 256) as u8]);
                    pushed.push(score);
                }
                pushed
            })
        })
        .collect();

    let mut all: Vec<f64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_by(|a, b| b.partial_cmp(a).unwrap());
    all.truncate(CAPACITY);

    let kept = scores(&list);
    assert_eq!(kept.len(), CAPACITY.min(THREADS * PUSHES));
    assert_eq!(kept, all);
}

proptest! {
    #[test]
    fn ordering_and_capacity_hold(
        capacity in 1usize..12,
        pushes in proptest::collection::vec((0u32..500, 0u8..6), 0..80)
    ) {
        let list = BestList::new(capacity, false, None);
        for (i, (score, d)) in pushes.iter().enumerate() {
            list.push_result(*score as f64, i, vec![*d]);
            let kept = scores(&list);
            prop_assert!(kept.len() <= capacity);
            prop_assert!(kept.windows(2).all(|w| w[0] >= w[1]));
        }
        prop_assert_eq!(list.len(), pushes.len().min(capacity));
    }

    #[test]
    fn dedup_never_keeps_twins(
        capacity in 1usize..10,
        pushes in proptest::collection::vec((0u32..100, 0u8..5), 0..60)
    ) {
        let list = BestList::new(capacity, true, None);
        for (score, d) in &pushes {
            list.push_result(*score as f64, (), vec![*d, *d]);
        }
        let top = list.get_top(capacity);
        for (i, a) in top.iter().enumerate() {
            for b in &top[i + 1..] {
                prop_assert_ne!(&a.decryption, &b.decryption);
            }
        }
        prop_assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn low_scores_leave_a_full_list_alone(
        base in proptest::collection::vec(100u32..1000, 5..20),
        low in 0u32..100
    ) {
        let list = BestList::new(5, false, None);
        for (i, s) in base.iter().enumerate() {
            list.push_result(*s as f64, i, vec![i as u8]);
        }
        let before = list.get_top(5);
        prop_assert_eq!(list.push_result(low as f64, 999, vec![250]), PushOutcome::Rejected);
        prop_assert_eq!(list.get_top(5), before);
    }
}
