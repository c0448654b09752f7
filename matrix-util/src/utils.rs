use fnv::FnvHashMap as HashMap;
use std::hash::Hash;

/// partition membership vector into groups of indexes
/// # Arguments
/// * `membership` - a vector of membership (E.g., cluster assignment)
/// # Returns
/// A hashmap: group name -> indexes of the elements in order
pub fn partition_by_membership<T>(membership: &[T]) -> HashMap<T, Vec<usize>>
where
    T: Eq + Hash + Clone,
{
    let mut pb_elems: HashMap<T, Vec<usize>> = HashMap::default();
    for (cell, k) in membership.iter().enumerate() {
        pb_elems.entry(k.clone()).or_default().push(cell);
    }
    pb_elems
}

/// Sorted distinct values
pub fn sorted_unique<T>(xs: &[T]) -> Vec<T>
where
    T: Ord + Clone,
{
    let mut ret = xs.to_vec();
    ret.sort();
    ret.dedup();
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_keeps_order() {
        let membership = vec!["b", "a", "b", "c", "a"];
        let groups = partition_by_membership(&membership);
        assert_eq!(groups[&"a"], vec![1, 4]);
        assert_eq!(groups[&"b"], vec![0, 2]);
        assert_eq!(groups[&"c"], vec![3]);
        assert_eq!(sorted_unique(&membership), vec!["a", "b", "c"]);
    }
}
