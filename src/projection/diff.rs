//! Minimal ordered edit scripts between two versions of a list.
//!
//! The script is computed from a longest common subsequence and addresses the
//! *evolving* working copy: after applying the first `k` operations to a copy
//! of `before`, operation `k + 1` is valid against that copy.

use std::cmp::max;

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[derive(Debug, PartialEq, Eq)]
pub enum DiffOp<'a, T> {
    /// `item` (at `before_idx` in the old list) leaves the working copy at `at`.
    Remove {
        item: &'a T,
        before_idx: usize,
        at: usize,
    },
    /// `item` (at `after_idx` in the new list) enters the working copy at `at`.
    Add {
        item: &'a T,
        after_idx: usize,
        at: usize,
    },
}

/// Owned counterpart of [`DiffOp`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit<T> {
    Remove { item: T, before_idx: usize, at: usize },
    Add { item: T, after_idx: usize, at: usize },
}

impl<T: Clone> Edit<T> {
    pub fn apply(&self, working: &mut Vec<T>) {
        match self {
            Edit::Remove { at, .. } => {
                working.remove(*at);
            }
            Edit::Add { item, at, .. } => working.insert(*at, item.clone()),
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Emits the edit script turning `before` into `after`.
///
/// Matching prefix and suffix are skipped before the O(n·m) table is built.
/// Where several minimal scripts exist, removals are preferred over additions
/// at the same position, so identical inputs always give identical output.
pub fn diff_by<'a, T, E, F>(before: &'a [T], after: &'a [T], mut eq: E, mut emit: F)
where
    E: FnMut(&T, &T) -> bool,
    F: FnMut(DiffOp<'a, T>),
{
    let mut prefix = 0;
    while prefix < before.len() && prefix < after.len() && eq(&before[prefix], &after[prefix]) {
        prefix += 1;
    }

    let mut suffix = 0;
    while suffix < before.len() - prefix
        && suffix < after.len() - prefix
        && eq(
            &before[before.len() - 1 - suffix],
            &after[after.len() - 1 - suffix],
        )
    {
        suffix += 1;
    }

    let a = &before[prefix..before.len() - suffix];
    let b = &after[prefix..after.len() - suffix];
    let (n, m) = (a.len(), b.len());
    if n == 0 && m == 0 {
        return;
    }

    // lcs[i * width + j] = length of the LCS of a[i..] and b[j..]
    let width = m + 1;
    let mut lcs = vec![0usize; (n + 1) * width];
    let mut matches = vec![false; n * m];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if eq(&a[i], &b[j]) {
                matches[i * m + j] = true;
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                max(lcs[(i + 1) * width + j], lcs[i * width + j + 1])
            };
        }
    }

    // the working copy is always after[..prefix + j] ++ before[prefix + i..]
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && matches[i * m + j] {
            i += 1;
            j += 1;
        } else if i < n && (j == m || lcs[(i + 1) * width + j] >= lcs[i * width + j + 1]) {
            emit(DiffOp::Remove {
                item: &a[i],
                before_idx: prefix + i,
                at: prefix + j,
            });
            i += 1;
        } else {
            emit(DiffOp::Add {
                item: &b[j],
                after_idx: prefix + j,
                at: prefix + j,
            });
            j += 1;
        }
    }
}

pub fn diff<'a, T, F>(before: &'a [T], after: &'a [T], emit: F)
where
    T: PartialEq,
    F: FnMut(DiffOp<'a, T>),
{
    diff_by(before, after, |x, y| x == y, emit)
}

pub fn edit_script<T: Clone + PartialEq>(before: &[T], after: &[T]) -> Vec<Edit<T>> {
    let mut script = Vec::new();
    diff(before, after, |op| {
        script.push(match op {
            DiffOp::Remove {
                item,
                before_idx,
                at,
            } => Edit::Remove {
                item: item.clone(),
                before_idx,
                at,
            },
            DiffOp::Add {
                item,
                after_idx,
                at,
            } => Edit::Add {
                item: item.clone(),
                after_idx,
                at,
            },
        })
    });
    script
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(before: &[char], script: &[Edit<char>]) -> Vec<char> {
        let mut working = before.to_vec();
        for edit in script {
            edit.apply(&mut working);
        }
        working
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn equal_lists_need_no_edits() {
        assert!(edit_script(&chars("abc"), &chars("abc")).is_empty());
        assert!(edit_script::<char>(&[], &[]).is_empty());
    }

    #[test]
    fn from_and_to_empty() {
        let script = edit_script(&[], &chars("ab"));
        assert_eq!(
            script,
            vec![
                Edit::Add { item: 'a', after_idx: 0, at: 0 },
                Edit::Add { item: 'b', after_idx: 1, at: 1 },
            ]
        );

        let script = edit_script(&chars("ab"), &[]);
        assert_eq!(
            script,
            vec![
                Edit::Remove { item: 'a', before_idx: 0, at: 0 },
                Edit::Remove { item: 'b', before_idx: 1, at: 0 },
            ]
        );
    }

    #[test]
    fn keeps_the_common_subsequence() {
        let before = chars("abcabba");
        let after = chars("cbabac");
        let script = edit_script(&before, &after);

        // |before| + |after| - 2 * |LCS("abcabba", "cbabac")| = 7 + 6 - 2 * 4
        assert_eq!(script.len(), 5);
        assert_eq!(replay(&before, &script), after);
    }

    #[test]
    fn prefers_removal_before_addition() {
        let script = edit_script(&chars("xay"), &chars("xby"));
        assert_eq!(
            script,
            vec![
                Edit::Remove { item: 'a', before_idx: 1, at: 1 },
                Edit::Add { item: 'b', after_idx: 1, at: 1 },
            ]
        );
    }

    #[test]
    fn custom_equality() {
        let before = [(1, "one"), (2, "two")];
        let after = [(2, "TWO"), (3, "three")];
        let mut ops = Vec::new();
        diff_by(&before, &after, |x, y| x.0 == y.0, |op| {
            ops.push(match op {
                DiffOp::Remove { item, at, .. } => (false, item.0, at),
                DiffOp::Add { item, at, .. } => (true, item.0, at),
            })
        });
        assert_eq!(ops, vec![(false, 1, 0), (true, 3, 1)]);
    }
}
