//! Slice-style windows over a list whose length keeps changing, and the
//! edge bookkeeping needed when a single element enters, leaves or moves.
//!
//! All edits produced here are ordered so that each one is valid against the
//! window output left behind by the previous one.

use {
    serde::{Deserialize, Serialize},
    std::ops::Range,
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Resolves a slice bound: negative values count from the end, the result is
/// clamped to `0..=len`.
pub fn begin_index(begin: isize, len: usize) -> usize {
    if begin < 0 {
        len.saturating_sub(begin.unsigned_abs())
    } else {
        begin.unsigned_abs().min(len)
    }
}

/// Like [`begin_index`], with `None` meaning "up to the end".
pub fn end_index(end: Option<isize>, len: usize) -> usize {
    match end {
        Some(end) => begin_index(end, len),
        None => len,
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub begin: isize,
    pub end: Option<isize>,
}

/// Which element an edit talks about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// The element that was inserted, removed or moved.
    Subject,
    /// Another element, by its position in the list *after* the mutation.
    At(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowEdit {
    Remove { at: usize, slot: Slot },
    Add { at: usize, slot: Slot },
}

impl Window {
    pub fn new(begin: isize, end: Option<isize>) -> Self {
        Window { begin, end }
    }

    pub fn unbounded() -> Self {
        Window::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.begin == 0 && self.end.is_none()
    }

    /// Absolute range covered in a list of `len` elements, empty when the
    /// bounds cross.
    pub fn resolve(&self, len: usize) -> Range<usize> {
        let begin = begin_index(self.begin, len);
        let end = end_index(self.end, len).max(begin);
        begin..end
    }

    /// Edits for an element inserted at `p` into a list of `len` elements.
    pub fn on_insert(&self, len: usize, p: usize) -> Vec<WindowEdit> {
        let from = self.resolve(len);
        let to = self.resolve(len + 1);

        // the new window, minus the subject, in old positions
        let lo = if to.start > p { to.start - 1 } else { to.start };
        let hi = if to.end > p { to.end - 1 } else { to.end };

        let mut edits = Vec::new();
        slide(from, lo..hi, None, |j| Slot::At(if j >= p { j + 1 } else { j }), &mut edits);

        if to.contains(&p) {
            edits.push(WindowEdit::Add {
                at: p - to.start,
                slot: Slot::Subject,
            });
        }
        edits
    }

    /// Edits for the element at `p` leaving a list of `len` elements.
    pub fn on_remove(&self, len: usize, p: usize) -> Vec<WindowEdit> {
        let from = self.resolve(len);
        let to = self.resolve(len.saturating_sub(1));

        let mut edits = Vec::new();
        if from.contains(&p) {
            edits.push(WindowEdit::Remove {
                at: p - from.start,
                slot: Slot::Subject,
            });
        }

        // the new window in old positions, `p` itself is a hole
        let lo = if to.start > p { to.start + 1 } else { to.start };
        let hi = if to.end > p { to.end + 1 } else { to.end };

        slide(from, lo..hi, Some(p), |j| Slot::At(if j > p { j - 1 } else { j }), &mut edits);
        edits
    }

    /// Edits for the element at `p` moving to `q` (position after the move)
    /// or changing in place (`p == q`) in a list of constant length `len`.
    pub fn on_move(&self, len: usize, p: usize, q: usize) -> Vec<WindowEdit> {
        let window = self.resolve(len);
        if window.is_empty() {
            return Vec::new();
        }

        let (b, e) = (window.start, window.end);
        let moved = |j: usize| {
            let k = if j > p { j - 1 } else { j };
            Slot::At(if k >= q { k + 1 } else { k })
        };

        let leave_front = WindowEdit::Remove { at: 0, slot: moved(b) };
        let leave_back = WindowEdit::Remove {
            at: e - 1 - b,
            slot: moved(e - 1),
        };
        let enter_front = WindowEdit::Add {
            at: 0,
            slot: Slot::At(b),
        };
        let enter_back = WindowEdit::Add {
            at: e - 1 - b,
            slot: Slot::At(e - 1),
        };

        match (window.contains(&p), window.contains(&q)) {
            (true, true) => vec![
                WindowEdit::Remove {
                    at: p - b,
                    slot: Slot::Subject,
                },
                WindowEdit::Add {
                    at: q - b,
                    slot: Slot::Subject,
                },
            ],
            (true, false) => vec![
                WindowEdit::Remove {
                    at: p - b,
                    slot: Slot::Subject,
                },
                if q >= e { enter_back } else { enter_front },
            ],
            (false, true) => vec![
                if p < b { leave_front } else { leave_back },
                WindowEdit::Add {
                    at: q - b,
                    slot: Slot::Subject,
                },
            ],
            (false, false) if p < b && q >= e => vec![leave_front, enter_back],
            (false, false) if p >= e && q < b => vec![leave_back, enter_front],
            (false, false) => Vec::new(),
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Turns the output `from` into the output `to`, both given as ranges of old
/// positions that skip `hole`. `slot` maps an old position to the element
/// reference put into the edit.
fn slide(
    from: Range<usize>,
    to: Range<usize>,
    hole: Option<usize>,
    slot: impl Fn(usize) -> Slot,
    edits: &mut Vec<WindowEdit>,
) {
    let present = |j: &usize| hole != Some(*j);
    let rel = |j: usize, start: usize| {
        j - start - usize::from(hole.is_some_and(|h| start <= h && h < j))
    };

    let common = from.start.max(to.start)..from.end.min(to.end);
    if common.is_empty() {
        for j in from.filter(present) {
            edits.push(WindowEdit::Remove { at: 0, slot: slot(j) });
        }
        for j in to.clone().filter(present) {
            edits.push(WindowEdit::Add {
                at: rel(j, to.start),
                slot: slot(j),
            });
        }
        return;
    }

    for j in (common.end..from.end).rev().filter(present) {
        edits.push(WindowEdit::Remove {
            at: rel(j, from.start),
            slot: slot(j),
        });
    }
    for j in (from.start..common.start).filter(present) {
        edits.push(WindowEdit::Remove { at: 0, slot: slot(j) });
    }
    for j in (to.start..common.start).rev().filter(present) {
        edits.push(WindowEdit::Add { at: 0, slot: slot(j) });
    }
    for j in (common.end..to.end).filter(present) {
        edits.push(WindowEdit::Add {
            at: rel(j, to.start),
            slot: slot(j),
        });
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[cfg(test)]
mod tests {
    use super::*;

    /// Applies `edits` to the windowed `old` list and compares with the
    /// window over `new`.
    fn check(window: Window, old: &[char], new: &[char], subject: (char, char), edits: &[WindowEdit]) {
        let range = window.resolve(old.len());
        let mut out = old[range].to_vec();
        for edit in edits {
            match *edit {
                WindowEdit::Remove { at, slot } => {
                    let expect = match slot {
                        Slot::Subject => subject.0,
                        Slot::At(j) => new[j],
                    };
                    assert_eq!(out.remove(at), expect, "{:?} in {:?}", edit, edits);
                }
                WindowEdit::Add { at, slot } => {
                    let item = match slot {
                        Slot::Subject => subject.1,
                        Slot::At(j) => new[j],
                    };
                    out.insert(at, item);
                }
            }
        }
        assert_eq!(out, new[window.resolve(new.len())].to_vec(), "{:?}", edits);
    }

    fn windows() -> Vec<Window> {
        let mut all = Vec::new();
        for begin in -5..=5 {
            all.push(Window::new(begin, None));
            for end in -5..=5 {
                all.push(Window::new(begin, Some(end)));
            }
        }
        all
    }

    #[test]
    fn bounds_follow_slice_semantics() {
        assert_eq!(Window::new(1, Some(3)).resolve(4), 1..3);
        assert_eq!(Window::new(-2, None).resolve(4), 2..4);
        assert_eq!(Window::new(-9, Some(-1)).resolve(4), 0..3);
        assert_eq!(Window::new(3, Some(1)).resolve(4), 3..3);
        assert_eq!(Window::new(7, None).resolve(4), 4..4);
        assert_eq!(Window::unbounded().resolve(0), 0..0);
        assert!(Window::unbounded().is_unbounded());
    }

    #[test]
    fn insert_before_window_shifts_it() {
        // [banana, pineapple, orange, apple][1..3], kiwi inserted at 0
        let edits = Window::new(1, Some(3)).on_insert(4, 0);
        assert_eq!(
            edits,
            vec![
                WindowEdit::Remove { at: 1, slot: Slot::At(3) },
                WindowEdit::Add { at: 0, slot: Slot::At(1) },
            ]
        );
    }

    #[test]
    fn insert_everywhere() {
        let base: Vec<char> = "abcdefg".chars().collect();
        for window in windows() {
            for len in 0..base.len() {
                let old = &base[..len];
                for p in 0..=len {
                    let mut new = old.to_vec();
                    new.insert(p, 'X');
                    let edits = window.on_insert(len, p);
                    check(window, old, &new, ('X', 'X'), &edits);
                }
            }
        }
    }

    #[test]
    fn remove_everywhere() {
        let base: Vec<char> = "abcdefg".chars().collect();
        for window in windows() {
            for len in 1..=base.len() {
                let old = &base[..len];
                for p in 0..len {
                    let mut new = old.to_vec();
                    let gone = new.remove(p);
                    let edits = window.on_remove(len, p);
                    check(window, old, &new, (gone, gone), &edits);
                }
            }
        }
    }

    #[test]
    fn move_everywhere() {
        let base: Vec<char> = "abcdefg".chars().collect();
        for window in windows() {
            for len in 1..=base.len() {
                let old = &base[..len];
                for p in 0..len {
                    for q in 0..len {
                        let mut new = old.to_vec();
                        let subject = new.remove(p);
                        new.insert(q, 'X');
                        let edits = window.on_move(len, p, q);
                        check(window, old, &new, (subject, 'X'), &edits);
                    }
                }
            }
        }
    }

    #[test]
    fn at_most_one_edit_per_edge() {
        let window = Window::new(1, Some(4));
        assert_eq!(window.on_move(6, 0, 5).len(), 2);
        assert_eq!(window.on_move(6, 2, 2).len(), 2);
        assert!(window.on_move(6, 4, 5).is_empty());
        assert!(window.on_insert(6, 5).is_empty());
    }
}
