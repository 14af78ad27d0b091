//! Recency list for the LRU cache
//!
//! Circular doubly-linked list whose nodes live in a `Vec` arena. Slot 0 is
//! the sentinel: its `next` is the most recently used entry (head) and its
//! `prev` the least recently used one (tail). Links are arena indices, so
//! splicing stays O(1) without raw pointers.

use std::iter::FusedIterator;

/// Index of a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Handle(usize);

/// The sentinel node, always linked (to itself when the list is empty)
pub(crate) const SENTINEL: Handle = Handle(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Links {
    prev: Handle,
    next: Handle,
}

/// Node in the arena.
///
/// `links` is `None` while the node is detached. `entry` is `None` for the
/// sentinel and for slots on the free list.
struct Node<K, V> {
    entry: Option<(K, V)>,
    links: Option<Links>,
}

impl<K, V> Node<K, V> {
    fn sentinel() -> Self {
        Self {
            entry: None,
            links: Some(Links {
                prev: SENTINEL,
                next: SENTINEL,
            }),
        }
    }
}

/// Arena-backed recency list
pub(crate) struct RecencyList<K, V> {
    nodes: Vec<Node<K, V>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    /// Create an empty list with room for `capacity` entries
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity + 1);
        nodes.push(Node::sentinel());

        Self {
            nodes,
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Number of linked entries (sentinel excluded)
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Store a new entry in a detached node
    pub(crate) fn alloc(&mut self, key: K, value: V) -> Handle {
        let node = Node {
            entry: Some((key, value)),
            links: None,
        };

        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx] = node;
            Handle(idx)
        } else {
            self.nodes.push(node);
            Handle(self.nodes.len() - 1)
        }
    }

    /// Release a detached node, handing back its entry
    pub(crate) fn free(&mut self, handle: Handle) -> Option<(K, V)> {
        debug_assert_ne!(handle, SENTINEL, "sentinel cannot be freed");
        debug_assert!(
            self.nodes[handle.0].links.is_none(),
            "node {} freed while linked",
            handle.0
        );

        let entry = self.nodes[handle.0].entry.take();
        if entry.is_some() {
            self.free_list.push(handle.0);
        }
        entry
    }

    /// Remove a node from the list, joining its neighbours.
    ///
    /// No-op if the node is already detached.
    pub(crate) fn unlink(&mut self, handle: Handle) {
        debug_assert_ne!(handle, SENTINEL, "sentinel cannot be unlinked");

        let Some(Links { prev, next }) = self.nodes[handle.0].links.take() else {
            return;
        };

        self.links_mut(prev).next = next;
        self.links_mut(next).prev = prev;
        self.len -= 1;
    }

    /// Splice a detached node in right after `anchor`
    pub(crate) fn insert_after(&mut self, handle: Handle, anchor: Handle) {
        debug_assert_ne!(handle, SENTINEL, "sentinel cannot be re-inserted");
        debug_assert!(
            self.nodes[handle.0].links.is_none(),
            "node {} inserted while linked",
            handle.0
        );

        let next = self.links_mut(anchor).next;
        self.nodes[handle.0].links = Some(Links { prev: anchor, next });
        self.links_mut(anchor).next = handle;
        self.links_mut(next).prev = handle;
        self.len += 1;
    }

    /// Make `handle` the most recently used entry
    pub(crate) fn move_to_front(&mut self, handle: Handle) {
        self.unlink(handle);
        self.insert_after(handle, SENTINEL);
    }

    /// Least recently used entry, if any
    pub(crate) fn tail(&self) -> Option<Handle> {
        let prev = self.links(SENTINEL).prev;
        (prev != SENTINEL).then_some(prev)
    }

    pub(crate) fn value(&self, handle: Handle) -> Option<&V> {
        self.nodes[handle.0].entry.as_ref().map(|(_, value)| value)
    }

    /// Drop every entry and reset the sentinel
    pub(crate) fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[SENTINEL.0] = Node::sentinel();
        self.free_list.clear();
        self.len = 0;
    }

    /// Walk entries from most to least recently used
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.links(SENTINEL).next,
            remaining: self.len,
        }
    }

    fn links(&self, handle: Handle) -> &Links {
        match self.nodes[handle.0].links.as_ref() {
            Some(links) => links,
            None => unreachable!("node {} is not linked", handle.0),
        }
    }

    fn links_mut(&mut self, handle: Handle) -> &mut Links {
        match self.nodes[handle.0].links.as_mut() {
            Some(links) => links,
            None => unreachable!("node {} is not linked", handle.0),
        }
    }

    /// Walk the ring both ways and check it agrees with `len`
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut forward = 0;
        let mut cursor = self.links(SENTINEL).next;
        while cursor != SENTINEL {
            let links = self.links(cursor);
            assert_eq!(self.links(links.next).prev, cursor, "broken back link");
            assert!(self.nodes[cursor.0].entry.is_some(), "linked node has no entry");
            forward += 1;
            cursor = links.next;
        }

        let mut backward = 0;
        let mut cursor = self.links(SENTINEL).prev;
        while cursor != SENTINEL {
            backward += 1;
            cursor = self.links(cursor).prev;
        }

        assert_eq!(forward, self.len);
        assert_eq!(backward, self.len);
        for &idx in &self.free_list {
            assert!(self.nodes[idx].links.is_none(), "free slot {} still linked", idx);
            assert!(self.nodes[idx].entry.is_none(), "free slot {} still owns an entry", idx);
        }
    }
}

/// Iterator over cache entries, most recently used first
pub struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    cursor: Handle,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == SENTINEL {
            return None;
        }

        let node = &self.list.nodes[self.cursor.0];
        self.cursor = node.links.map_or(SENTINEL, |links| links.next);
        self.remaining = self.remaining.saturating_sub(1);
        node.entry.as_ref().map(|(key, value)| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
