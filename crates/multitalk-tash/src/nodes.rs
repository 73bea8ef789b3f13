use std::fmt;

/// Size of the node-ID bitmap: one bit for each of the 256 node IDs.
pub const NODE_SET_SIZE: usize = 32;

/// The set of LocalTalk node IDs the board should answer for.
///
/// Byte `i` covers IDs `8i..=8i+7`, least-significant bit first. The set is
/// fixed once built; build a new one to change the filter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeSet {
    bits: [u8; NODE_SET_SIZE],
}

impl NodeSet {
    /// Build a set from a list of node IDs. Duplicates are ignored.
    pub fn new(ids: impl IntoIterator<Item = u8>) -> Self {
        let mut bits = [0u8; NODE_SET_SIZE];
        for id in ids {
            bits[usize::from(id / 8)] |= 1 << (id % 8);
        }
        Self { bits }
    }

    /// Returns true if `id` is in the set.
    pub fn contains(&self, id: u8) -> bool {
        self.bits[usize::from(id / 8)] & (1 << (id % 8)) != 0
    }

    /// The wire representation of the set.
    pub fn as_bytes(&self) -> &[u8; NODE_SET_SIZE] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// Member IDs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|&id| self.contains(id))
    }
}

impl FromIterator<u8> for NodeSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Debug for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_layout() {
        let set = NodeSet::new([1, 2, 3, 4, 5, 254]);
        let bytes = set.as_bytes();
        assert_eq!(bytes[0], 0x3e);
        assert_eq!(bytes[31], 0x40);
        assert!(bytes[1..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn membership() {
        let set: NodeSet = [0, 7, 8, 255].into_iter().collect();
        for id in 0..=u8::MAX {
            assert_eq!(set.contains(id), matches!(id, 0 | 7 | 8 | 255), "id {id}");
        }
        assert_eq!(set.len(), 4);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 7, 8, 255]);
    }

    #[test]
    fn empty_and_duplicates() {
        assert!(NodeSet::default().is_empty());
        let set = NodeSet::new([9, 9, 9]);
        assert_eq!(set.len(), 1);
        assert_eq!(format!("{set:?}"), "{9}");
    }
}
