//! Property-based invariant tests for derived views.
//!
//! 1. Edit scripts turn `before` into `after` and have minimal length.
//! 2. After any sequence of source inserts, removes and item changes the view
//!    equals the filtered, sorted and sliced source computed from scratch.
//! 3. Replaying every emitted diff onto a mirror reproduces the view.

use proptest::prelude::*;
use r3vi_derived::{
    buffer::{item::ItemCell, vec::VecBuffer},
    projection::{diff::edit_script, window::Window, DerivedView, ViewOptions},
    view::{ListDiff, ListView, NotifyFnObserver, Observer, TaskQueue},
};
use std::sync::{Arc, Mutex};

// ── Helpers ─────────────────────────────────────────────────────────────

fn lcs_len(a: &[u8], b: &[u8]) -> usize {
    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    table[0][0]
}

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Set(usize, i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), -20i32..20).prop_map(|(p, v)| Op::Insert(p, v)),
        any::<usize>().prop_map(Op::Remove),
        (any::<usize>(), -20i32..20).prop_map(|(p, v)| Op::Set(p, v)),
    ]
}

fn window_strategy() -> impl Strategy<Value = Window> {
    (-5isize..6, prop::option::of(-5isize..8)).prop_map(|(begin, end)| Window::new(begin, end))
}

#[derive(Clone, Copy, Debug)]
struct Shape {
    filtered: bool,
    sorted: bool,
    coalesced: bool,
    window: Window,
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    (any::<bool>(), any::<bool>(), any::<bool>(), window_strategy()).prop_map(
        |(filtered, sorted, coalesced, window)| Shape {
            filtered,
            sorted,
            coalesced,
            window,
        },
    )
}

fn keep(x: i32) -> bool {
    x % 3 != 0
}

fn from_scratch(values: &[i32], shape: Shape) -> Vec<i32> {
    let mut out: Vec<i32> = values
        .iter()
        .copied()
        .filter(|x| !shape.filtered || keep(*x))
        .collect();
    if shape.sorted {
        out.sort();
    }
    out[shape.window.resolve(out.len())].to_vec()
}

/// Applies `ops` one by one. Coalesced resyncs only run after every
/// `flush_every` ops, so source inserts and removes also land while a resync
/// is still pending.
fn run(initial: Vec<i32>, ops: Vec<Op>, shape: Shape, flush_every: usize) -> Result<(), TestCaseError> {
    let buffer: VecBuffer<ItemCell<i32>> = initial.into_iter().map(ItemCell::new).collect();
    let queue = Arc::new(TaskQueue::new());

    let mut opts = ViewOptions::mapped(|c: &ItemCell<i32>| c.get()).window(shape.window);
    if shape.filtered {
        opts = opts.filter(|c| keep(c.get()));
    }
    if shape.sorted {
        opts = opts.compare(|a, b| a.cmp(b));
    }
    if shape.coalesced {
        opts = opts.coalesce(queue.clone());
    }
    let view = DerivedView::new(buffer.get_view(), opts).unwrap();

    let mirror = Arc::new(Mutex::new(view.to_array()));
    let obs: Arc<dyn Observer<dyn ListView<i32>>> =
        Arc::new(NotifyFnObserver::<dyn ListView<i32>, _>::new({
            let mirror = mirror.clone();
            move |diff: &ListDiff<i32>| diff.apply_to(&mut mirror.lock().unwrap()).unwrap()
        }));
    view.add_observer(obs);

    let count = ops.len();
    for (n, op) in ops.into_iter().enumerate() {
        let len = buffer.len();
        match op {
            Op::Insert(p, v) => buffer.insert(p % (len + 1), ItemCell::new(v)),
            Op::Remove(p) if len > 0 => {
                buffer.remove(p % len);
            }
            Op::Set(p, v) if len > 0 => {
                if let Some(cell) = buffer.get(p % len) {
                    cell.set(v);
                }
            }
            _ => {}
        }
        prop_assert_eq!(&*mirror.lock().unwrap(), &view.to_array());
        prop_assert_eq!(view.len(), view.to_array().len());

        if (n + 1) % flush_every == 0 || n + 1 == count {
            queue.flush();

            let values: Vec<i32> = buffer.to_vec().iter().map(|c| c.get()).collect();
            prop_assert_eq!(view.to_array(), from_scratch(&values, shape), "{:?} after {:?}", shape, values);
            prop_assert_eq!(&*mirror.lock().unwrap(), &view.to_array());
        }
    }
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Edit scripts
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn edit_script_roundtrip(
        a in prop::collection::vec(0u8..4, 0..24),
        b in prop::collection::vec(0u8..4, 0..24),
    ) {
        let script = edit_script(&a, &b);
        let mut working = a.clone();
        for edit in &script {
            edit.apply(&mut working);
        }
        prop_assert_eq!(&working, &b);
        prop_assert_eq!(script.len(), a.len() + b.len() - 2 * lcs_len(&a, &b));
    }
}

proptest! {
    #[test]
    fn edit_script_of_equal_lists_is_empty(a in prop::collection::vec(any::<u8>(), 0..32)) {
        prop_assert!(edit_script(&a, &a).is_empty());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2./3. View against a from-scratch recomputation and an event mirror
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn view_tracks_source(
        initial in prop::collection::vec(-20i32..20, 0..10),
        ops in prop::collection::vec(op_strategy(), 0..40),
        shape in shape_strategy(),
        flush_every in 1usize..6,
    ) {
        run(initial, ops, shape, flush_every)?;
    }
}
