//! Link identity -> regions touching it.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::types::RegionLink;
use crate::grid::RegionKey;

/// Regions sharing one link. Two in a settled system, transiently one or more.
pub type LinkBucket = SmallVec<[RegionKey; 2]>;

/// Index from each boundary link to the region keys that list it.
///
/// Stores keys only. A region's own link list is the source of truth for which
/// buckets it must be removed from.
#[derive(Clone, Debug, Default)]
pub struct LinkIndex {
    buckets: FxHashMap<RegionLink, LinkBucket>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` under `link`. Registering twice is a no-op.
    pub fn add(&mut self, link: RegionLink, key: RegionKey) {
        let bucket = self.buckets.entry(link).or_default();
        if !bucket.contains(&key) {
            bucket.push(key);
        }
    }

    /// Remove `key` from the bucket of every link in `links`, dropping empty buckets.
    pub fn remove_all_for(&mut self, key: RegionKey, links: &[RegionLink]) {
        for link in links {
            if let Some(bucket) = self.buckets.get_mut(link) {
                bucket.retain(|k| *k != key);
                if bucket.is_empty() {
                    self.buckets.remove(link);
                }
            }
        }
    }

    /// Any key other than `key` registered under `link`.
    ///
    /// `None` when the bucket is missing or only holds `key` (a stale link).
    pub fn other_side(&self, link: &RegionLink, key: RegionKey) -> Option<RegionKey> {
        self.buckets
            .get(link)?
            .iter()
            .copied()
            .find(|other| *other != key)
    }

    /// Distinct regions on the far side of `links`, in first-seen order.
    pub fn adjacent_keys(&self, key: RegionKey, links: &[RegionLink]) -> Vec<RegionKey> {
        let mut adjacent = Vec::new();
        for link in links {
            if let Some(other) = self.other_side(link, key) {
                if !adjacent.contains(&other) {
                    adjacent.push(other);
                }
            }
        }
        adjacent
    }

    pub fn regions_for(&self, link: &RegionLink) -> &[RegionKey] {
        self.buckets.get(link).map(|b| b.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegionLink, &[RegionKey])> {
        self.buckets.iter().map(|(link, keys)| (link, keys.as_slice()))
    }

    /// Number of distinct links.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPos;
    use crate::regions::types::LinkDirection;

    fn key(x: i32, y: i32) -> RegionKey {
        RegionKey(GridPos::new(x, y))
    }

    fn link(x: i32, y: i32, length: u32) -> RegionLink {
        RegionLink::new(GridPos::new(x, y), LinkDirection::AlongColumn, length)
    }

    #[test]
    fn test_other_side_and_adjacency() {
        let mut index = LinkIndex::new();
        let (a, b, c) = (key(0, 0), key(4, 0), key(4, 4));
        index.add(link(4, 0, 2), a);
        index.add(link(4, 0, 2), b);
        index.add(link(4, 2, 2), a);
        index.add(link(4, 2, 2), b);
        index.add(link(4, 5, 1), a);
        index.add(link(4, 5, 1), c);

        assert_eq!(index.len(), 3);
        assert_eq!(index.other_side(&link(4, 0, 2), a), Some(b));
        assert_eq!(index.other_side(&link(4, 0, 2), b), Some(a));

        let a_links = [link(4, 0, 2), link(4, 2, 2), link(4, 5, 1)];
        assert_eq!(index.adjacent_keys(a, &a_links), vec![b, c]);
    }

    #[test]
    fn test_same_identity_different_length_are_distinct_links() {
        let mut index = LinkIndex::new();
        index.add(link(4, 0, 2), key(0, 0));
        index.add(link(4, 0, 3), key(4, 0));
        assert_eq!(index.len(), 2);
        assert_eq!(index.other_side(&link(4, 0, 2), key(0, 0)), None);
    }

    #[test]
    fn test_stale_bucket_has_no_other_side() {
        let mut index = LinkIndex::new();
        let (a, b) = (key(0, 0), key(4, 0));
        index.add(link(4, 0, 2), a);
        index.add(link(4, 0, 2), b);
        index.remove_all_for(b, &[link(4, 0, 2)]);

        assert_eq!(index.other_side(&link(4, 0, 2), a), None);
        assert_eq!(index.regions_for(&link(4, 0, 2)), &[a]);

        index.remove_all_for(a, &[link(4, 0, 2)]);
        assert!(index.is_empty(), "empty buckets are dropped");
        assert_eq!(index.other_side(&link(4, 0, 2), a), None);
    }
}
