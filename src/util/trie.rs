//! Byte-keyed trie with child and sibling links
//!
//! Only insertion and lookup are supported, which is all an LZW dictionary
//! needs. Nodes live in a [`Pool`], so clearing the dictionary between
//! frames (or on an LZW clear code) never frees memory.

use super::pool::{Pool, PoolIndex};

#[derive(Debug, Clone, Copy)]
struct TrieNode {
    key: u8,
    value: u16,
    child: Option<PoolIndex>,
    sibling: Option<PoolIndex>,
}

/// Handle to a node of a [`Trie`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieRef(PoolIndex);

/// Dictionary of byte strings mapped to 16-bit codes.
///
/// The first `roots` nodes are the single-byte strings `0..roots`, each
/// mapped to its own value.
#[derive(Debug, Default)]
pub struct Trie {
    nodes: Pool<TrieNode>,
    roots: usize,
}

impl Trie {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every string and seed the single-byte roots `0..roots`
    pub fn reset(&mut self, roots: usize) {
        self.nodes.reset();
        self.roots = roots.min(256);
        for key in 0..self.roots {
            self.nodes.push(TrieNode {
                key: key as u8,
                value: key as u16,
                child: None,
                sibling: None,
            });
        }
    }

    /// Node for the single-byte string `key`
    #[must_use]
    pub fn root(&self, key: u8) -> Option<TrieRef> {
        let index = usize::from(key);
        if index >= self.roots {
            return None;
        }
        self.nodes.index_at(index).map(TrieRef)
    }

    /// Value stored on a node
    #[must_use]
    pub fn value(&self, node: TrieRef) -> u16 {
        self.nodes[node.0].value
    }

    /// Find the node extending `node` by `key`
    #[must_use]
    pub fn child(&self, node: TrieRef, key: u8) -> Option<TrieRef> {
        let mut cursor = self.nodes[node.0].child;
        while let Some(index) = cursor {
            let current = &self.nodes[index];
            if current.key == key {
                return Some(TrieRef(index));
            }
            cursor = current.sibling;
        }
        None
    }

    /// Insert the string `node + key` with `value`.
    ///
    /// New children are prepended to the sibling chain.
    pub fn insert_child(&mut self, node: TrieRef, key: u8, value: u16) -> TrieRef {
        let sibling = self.nodes[node.0].child;
        let index = self.nodes.push(TrieNode {
            key,
            value,
            child: None,
            sibling,
        });
        self.nodes[node.0].child = Some(index);
        TrieRef(index)
    }

    /// Number of strings stored, roots included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.used()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_map_to_themselves() {
        let mut trie = Trie::new();
        trie.reset(4);

        assert_eq!(trie.len(), 4);
        let root = trie.root(3).unwrap();
        assert_eq!(trie.value(root), 3);
        assert!(trie.root(4).is_none());
    }

    #[test]
    fn test_insert_and_find_strings() {
        let mut trie = Trie::new();
        trie.reset(4);

        let a = trie.root(1).unwrap();
        let ab = trie.insert_child(a, 2, 6);
        trie.insert_child(a, 0, 7);
        let abc = trie.insert_child(ab, 3, 8);

        assert_eq!(trie.child(a, 2), Some(ab));
        assert_eq!(trie.value(trie.child(a, 0).unwrap()), 7);
        assert_eq!(trie.child(ab, 3), Some(abc));
        assert!(trie.child(a, 1).is_none());
    }

    #[test]
    fn test_reset_forgets_strings() {
        let mut trie = Trie::new();
        trie.reset(4);
        let root = trie.root(0).unwrap();
        trie.insert_child(root, 1, 6);

        trie.reset(4);
        let root = trie.root(0).unwrap();
        assert!(trie.child(root, 1).is_none());
        assert_eq!(trie.len(), 4);
    }
}
