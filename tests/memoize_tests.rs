//! Tests for the memoize wrapper.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, OnceLock};

use function_helpers::memoize::{memoize, memoize_with, Memoize};
use pretty_assertions::assert_eq;

fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    (count.clone(), count)
}

#[test]
fn doubling_example_computes_each_distinct_argument_once() {
    let (runs, runs_for_fn) = counter();
    let double = memoize(move |x: i64| {
        runs_for_fn.fetch_add(1, Ordering::SeqCst);
        x * 2
    });

    let results = vec![double.call(3), double.call(3), double.call(4)];

    assert_eq!(results, vec![6, 6, 8]);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(double.len(), 2);
}

#[test]
fn arguments_with_the_same_derived_key_share_one_entry() {
    let (runs, runs_for_fn) = counter();
    let greet = memoize_with(
        move |name: String| {
            runs_for_fn.fetch_add(1, Ordering::SeqCst);
            format!("hello {name}")
        },
        |name: &String| name.to_lowercase(),
    );

    assert_eq!(greet.call("Ada".to_string()), "hello Ada");
    assert_eq!(greet.call("ADA".to_string()), "hello Ada");
    assert_eq!(greet.call("grace".to_string()), "hello grace");

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert!(greet.contains_key(&"ada".to_string()));
    assert_eq!(greet.get(&"grace".to_string()), Some("hello grace".to_string()));
}

#[test]
fn cached_value_never_changes_for_non_deterministic_body() {
    let (_, sequence) = counter();
    let next = memoize(move |_: u8| sequence.fetch_add(1, Ordering::SeqCst));

    let first = next.call(1);
    for _ in 0..5 {
        assert_eq!(next.call(1), first);
    }
    assert_ne!(next.call(2), first);
}

// Presence is checked by key, so falsy-looking results are cached too.
#[test]
fn falsy_results_are_cached_not_recomputed() {
    let (zero_runs, zero_for_fn) = counter();
    let zero = memoize(move |x: i32| {
        zero_for_fn.fetch_add(1, Ordering::SeqCst);
        x.min(0)
    });
    let (empty_runs, empty_for_fn) = counter();
    let empty = memoize(move |_: u8| {
        empty_for_fn.fetch_add(1, Ordering::SeqCst);
        String::new()
    });
    let (none_runs, none_for_fn) = counter();
    let nothing = memoize(move |_: bool| {
        none_for_fn.fetch_add(1, Ordering::SeqCst);
        None::<u32>
    });

    for _ in 0..3 {
        assert_eq!(zero.call(7), 0);
        assert_eq!(empty.call(1), "");
        assert_eq!(nothing.call(false), None);
    }

    assert_eq!(zero_runs.load(Ordering::SeqCst), 1);
    assert_eq!(empty_runs.load(Ordering::SeqCst), 1);
    assert_eq!(none_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn tuple_arguments_can_key_on_the_first_element() {
    let area = memoize_with(
        |(w, h): (u32, u32)| w * h,
        |(w, _): &(u32, u32)| *w,
    );

    assert_eq!(area.call((2, 3)), 6);
    assert_eq!(area.call((2, 100)), 6);
    assert_eq!(area.call((3, 3)), 9);
    assert_eq!(area.len(), 2);
}

#[test]
fn recursive_body_can_call_its_own_wrapper() {
    let slot: Arc<OnceLock<Memoize<u64, u64, u64>>> = Arc::new(OnceLock::new());
    let slot_for_fn = slot.clone();
    let (runs, runs_for_fn) = counter();

    let fib = memoize(move |n: u64| {
        runs_for_fn.fetch_add(1, Ordering::SeqCst);
        if n < 2 {
            return n;
        }
        let fib = slot_for_fn.get().expect("slot set");
        fib.call(n - 1) + fib.call(n - 2)
    });
    slot.set(fib.clone()).unwrap();

    assert_eq!(fib.call(50), 12_586_269_025);
    assert_eq!(runs.load(Ordering::SeqCst), 51);
}

#[test]
fn concurrent_callers_all_receive_the_stored_value() {
    let (_, sequence) = counter();
    let stamp = memoize(move |_: &'static str| sequence.fetch_add(1, Ordering::SeqCst));
    let thread_count = 8;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let stamp = stamp.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                stamp.call("shared")
            })
        })
        .collect();
    let results: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let stored = stamp.get(&"shared").unwrap();
    assert!(results.iter().all(|r| *r == stored));
    assert_eq!(stamp.len(), 1);
}

#[test]
fn empty_cache_reports_empty() {
    let identity = memoize(|x: char| x);
    assert!(identity.is_empty());
    assert_eq!(format!("{identity:?}"), "Memoize { entries: 0 }");
    identity.call('a');
    assert!(!identity.is_empty());
}

#[test]
fn panicking_miss_stores_nothing_and_is_retried() {
    let (runs, runs_for_fn) = counter();
    let checked = memoize(move |x: u32| {
        if runs_for_fn.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first computation fails");
        }
        x + 1
    });

    assert!(catch_unwind(AssertUnwindSafe(|| checked.call(4))).is_err());
    assert_eq!(checked.len(), 0);
    assert!(!checked.contains_key(&4));

    assert_eq!(checked.call(4), 5);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(checked.len(), 1);
}
