/// Grouping helpers: organize flat per-observation columns into per-track
/// row sets, and reduce a group to its most frequent value.

use std::collections::{BTreeMap, HashMap};

/// Row indices for each distinct track id.
///
/// Groups come out in order of each id's first appearance, and row order
/// within a group follows the input.
pub fn group_by_track<S: AsRef<str>>(track_id: &[S]) -> Vec<(String, Vec<usize>)> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();

    for (row, id) in track_id.iter().enumerate() {
        let id = id.as_ref();
        match position.get(id) {
            Some(&g) => groups[g].1.push(row),
            None => {
                position.insert(id, groups.len());
                groups.push((id.to_string(), vec![row]));
            }
        }
    }

    groups
}

/// Most frequent value among `values`.
///
/// Ties go to the smallest value, so the result never depends on input
/// order. Returns `None` for an empty iterator.
pub fn mode<T, I>(values: I) -> Option<T>
where
    T: Ord + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }

    let mut best: Option<(T, usize)> = None;
    // Ascending iteration plus strict `>` keeps the smallest tied value.
    for (value, count) in counts {
        let replace = match &best {
            Some((_, best_count)) => count > *best_count,
            None => true,
        };
        if replace {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}
