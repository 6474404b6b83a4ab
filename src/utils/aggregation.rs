use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Entry ranked by count, then by ascending key
struct Ranked<'a, K> {
    count: u64,
    key: &'a K,
}

impl<K: Ord> Ord for Ranked<'_, K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.key.cmp(self.key))
    }
}

impl<K: Ord> PartialOrd for Ranked<'_, K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> PartialEq for Ranked<'_, K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for Ranked<'_, K> {}

/// Select the `limit` highest counts, sorted descending, equal counts ordered
/// by ascending key. Asking for more than exists returns everything.
///
/// Only `limit` entries are held at any time, whatever the size of the input.
pub fn top_n<'a, K, I>(counts: I, limit: usize) -> Vec<(K, u64)>
where
    K: Ord + Clone + 'a,
    I: IntoIterator<Item = (&'a K, &'a u64)>,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut heap = BinaryHeap::with_capacity(limit + 1);
    for (key, &count) in counts {
        heap.push(Reverse(Ranked { count, key }));
        if heap.len() > limit {
            heap.pop();
        }
    }

    let mut ranked: Vec<_> = heap.into_iter().map(|Reverse(entry)| entry).collect();
    ranked.sort_by(|a, b| b.cmp(a));
    ranked
        .into_iter()
        .map(|entry| (entry.key.clone(), entry.count))
        .collect()
}
