use std::collections::HashMap;
use std::hash::Hash;

/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Most frequent value. On a tie the value seen first wins.
/// Returns `None` for empty input.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut tallies: Vec<(f64, usize)> = Vec::new();

    for &v in values {
        match index.get(&v.to_bits()) {
            Some(&i) => tallies[i].1 += 1,
            None => {
                index.insert(v.to_bits(), tallies.len());
                tallies.push((v, 1));
            }
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for (value, count) in tallies {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Groups values by key, keeping groups in the order their key first appears.
pub fn group_in_order<K, I>(items: I) -> Vec<(K, Vec<f64>)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<f64>)> = Vec::new();

    for (key, value) in items {
        match index.get(&key) {
            Some(&i) => groups[i].1.push(value),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![value]));
            }
        }
    }

    groups
}

/// Orders groups by size, largest first, keeping the incoming order between
/// equal sizes, and keeps at most `top_n` of them.
pub fn top_by_count<K>(mut groups: Vec<(K, Vec<f64>)>, top_n: usize) -> Vec<(K, Vec<f64>)> {
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    groups.truncate(top_n);
    groups
}
