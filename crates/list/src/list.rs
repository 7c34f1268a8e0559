//! Pool-backed singly linked list

use std::sync::Arc;

use mempool::{MemoryPool, PoolError, PoolStats};
use parking_lot::Mutex;

use crate::error::{ListError, ListResult};
use crate::node::{NODE_SIZE, Node, NodeRef};

#[derive(Debug)]
struct ListState {
    head: Option<NodeRef>,
    closed: bool,
}

/// Singly linked list of `u16` values stored in a [`MemoryPool`]
///
/// Every node is one pool block. The list lock is held for the whole of each
/// operation; pool calls made under it take and release the pool lock, so
/// locks are only ever acquired in list → pool order.
#[derive(Debug)]
pub struct PoolList {
    pool: Arc<MemoryPool>,
    state: Mutex<ListState>,
}

impl PoolList {
    /// Initializes `pool` with `size` bytes and returns an empty list on it
    pub fn init(pool: Arc<MemoryPool>, size: usize) -> ListResult<Self> {
        pool.init(size)?;
        tracing::debug!(size, "list initialized");
        Ok(Self {
            pool,
            state: Mutex::new(ListState {
                head: None,
                closed: false,
            }),
        })
    }

    /// Pool backing the nodes
    pub fn pool(&self) -> &Arc<MemoryPool> {
        &self.pool
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Appends `value` at the tail
    pub fn insert(&self, value: u16) -> ListResult<NodeRef> {
        let mut state = self.lock()?;
        let tail = self.tail(state.head)?;
        let node = self.create(value, None)?;
        match tail {
            Some(tail) => self.link_or_release(tail, node)?,
            None => state.head = Some(node),
        }
        tracing::debug!(value, %node, "inserted at tail");
        Ok(node)
    }

    /// Inserts `value` directly after `node`
    pub fn insert_after(&self, node: NodeRef, value: u16) -> ListResult<NodeRef> {
        let state = self.lock()?;
        self.ensure_member(state.head, node)?;

        let current = self.load(node)?;
        let created = self.create(value, current.next)?;
        self.link_or_release(node, created)?;
        tracing::debug!(value, after = %node, "inserted after node");
        Ok(created)
    }

    /// Inserts `value` directly before `node`
    pub fn insert_before(&self, node: NodeRef, value: u16) -> ListResult<NodeRef> {
        let mut state = self.lock()?;

        if state.head == Some(node) {
            let created = self.create(value, Some(node))?;
            state.head = Some(created);
            tracing::debug!(value, before = %node, "inserted new head");
            return Ok(created);
        }

        let prev = self
            .find(state.head, |_, next| next == Some(node))?
            .ok_or(ListError::NodeNotFound { node })?;
        let created = self.create(value, Some(node))?;
        self.link_or_release(prev, created)?;
        tracing::debug!(value, before = %node, "inserted before node");
        Ok(created)
    }

    /// Removes the first node holding `value`
    pub fn delete(&self, value: u16) -> ListResult<()> {
        let mut state = self.lock()?;

        let mut prev: Option<NodeRef> = None;
        let mut cursor = state.head;
        while let Some(node) = cursor {
            let current = self.load(node)?;
            if current.value == value {
                match prev {
                    Some(prev) => self.set_next(prev, current.next)?,
                    None => state.head = current.next,
                }
                self.pool.free(node.handle())?;
                tracing::debug!(value, %node, "deleted node");
                return Ok(());
            }
            prev = Some(node);
            cursor = current.next;
        }

        Err(ListError::ValueNotFound { value })
    }

    /// Frees every node and closes the pool
    ///
    /// Returns the pool's final statistics. The list rejects every operation
    /// afterwards with [`ListError::Closed`].
    pub fn cleanup(&self) -> ListResult<PoolStats> {
        let mut state = self.lock()?;

        // Advance the head only past nodes that were freed.
        let mut freed = 0usize;
        while let Some(node) = state.head {
            let next = self.load(node)?.next;
            self.pool.free(node.handle())?;
            state.head = next;
            freed += 1;
        }

        let stats = self.pool.deinit()?;
        state.closed = true;
        tracing::debug!(freed, "list cleaned up");
        Ok(stats)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// First node holding `value`
    pub fn search(&self, value: u16) -> ListResult<Option<NodeRef>> {
        let state = self.lock()?;
        let found = self.find(state.head, |current, _| current == value)?;
        if found.is_none() {
            tracing::debug!(value, "value not in list");
        }
        Ok(found)
    }

    /// Formats values from `start` through `end`, both inclusive
    ///
    /// `start` defaults to the head. When `end` is `None` or not reachable
    /// from `start`, the range runs to the end of the list.
    pub fn display_range(&self, start: Option<NodeRef>, end: Option<NodeRef>) -> ListResult<String> {
        let state = self.lock()?;
        if let Some(start) = start {
            self.ensure_member(state.head, start)?;
        }

        let mut values = Vec::new();
        let mut cursor = start.or(state.head);
        while let Some(node) = cursor {
            let current = self.load(node)?;
            values.push(current.value.to_string());
            if Some(node) == end {
                break;
            }
            cursor = current.next;
        }
        Ok(format!("[{}]", values.join(", ")))
    }

    /// Formats the whole list as `[a, b, c]`
    pub fn display(&self) -> ListResult<String> {
        self.display_range(None, None)
    }

    /// Number of nodes
    pub fn count(&self) -> ListResult<usize> {
        Ok(self.values()?.len())
    }

    /// Values in list order
    pub fn values(&self) -> ListResult<Vec<u16>> {
        let state = self.lock()?;
        let mut values = Vec::new();
        let mut cursor = state.head;
        while let Some(node) = cursor {
            let current = self.load(node)?;
            values.push(current.value);
            cursor = current.next;
        }
        Ok(values)
    }

    /// First node
    pub fn head(&self) -> ListResult<Option<NodeRef>> {
        Ok(self.lock()?.head)
    }

    /// Value stored in `node`
    pub fn value(&self, node: NodeRef) -> ListResult<u16> {
        let _state = self.lock()?;
        Ok(self.load(node)?.value)
    }

    /// Successor of `node`
    pub fn next(&self, node: NodeRef) -> ListResult<Option<NodeRef>> {
        let _state = self.lock()?;
        Ok(self.load(node)?.next)
    }

    // ------------------------------------------------------------------
    // Helpers (list lock held)
    // ------------------------------------------------------------------

    fn lock(&self) -> ListResult<parking_lot::MutexGuard<'_, ListState>> {
        let state = self.state.lock();
        if state.closed {
            return Err(ListError::Closed);
        }
        Ok(state)
    }

    fn create(&self, value: u16, next: Option<NodeRef>) -> ListResult<NodeRef> {
        let handle = self.pool.alloc(NODE_SIZE)?;
        let node = NodeRef::from(handle);
        if let Err(error) = self.store(node, Node { value, next }) {
            self.release(node);
            return Err(error);
        }
        Ok(node)
    }

    /// Points `prev` at `created`, freeing `created` if the link fails
    fn link_or_release(&self, prev: NodeRef, created: NodeRef) -> ListResult<()> {
        self.set_next(prev, Some(created)).inspect_err(|_| self.release(created))
    }

    /// Returns an unlinked node to the pool
    fn release(&self, node: NodeRef) {
        if let Err(error) = self.pool.free(node.handle()) {
            tracing::warn!(%node, %error, "failed to release unlinked node");
        }
    }

    fn load(&self, node: NodeRef) -> ListResult<Node> {
        let bytes = self
            .pool
            .read_at(node.handle(), 0, NODE_SIZE)
            .map_err(|error| not_found_as_node(error, node))?;
        Node::decode(&bytes).ok_or(ListError::NodeNotFound { node })
    }

    fn store(&self, node: NodeRef, contents: Node) -> ListResult<()> {
        self.pool
            .write(node.handle(), 0, &contents.encode())
            .map_err(|error| not_found_as_node(error, node))
    }

    fn set_next(&self, node: NodeRef, next: Option<NodeRef>) -> ListResult<()> {
        let mut contents = self.load(node)?;
        contents.next = next;
        self.store(node, contents)
    }

    /// Walks from `head` and returns the first node whose `(value, next)`
    /// satisfies `predicate`
    fn find(
        &self,
        head: Option<NodeRef>,
        mut predicate: impl FnMut(u16, Option<NodeRef>) -> bool,
    ) -> ListResult<Option<NodeRef>> {
        let mut cursor = head;
        while let Some(node) = cursor {
            let current = self.load(node)?;
            if predicate(current.value, current.next) {
                return Ok(Some(node));
            }
            cursor = current.next;
        }
        Ok(None)
    }

    fn tail(&self, head: Option<NodeRef>) -> ListResult<Option<NodeRef>> {
        self.find(head, |_, next| next.is_none())
    }

    fn ensure_member(&self, head: Option<NodeRef>, node: NodeRef) -> ListResult<()> {
        let mut cursor = head;
        while let Some(current) = cursor {
            if current == node {
                return Ok(());
            }
            cursor = self.load(current)?.next;
        }
        Err(ListError::NodeNotFound { node })
    }
}

fn not_found_as_node(error: PoolError, node: NodeRef) -> ListError {
    match error {
        PoolError::NotFound { .. } => ListError::NodeNotFound { node },
        other => ListError::Pool(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> PoolList {
        PoolList::init(Arc::new(MemoryPool::new()), 1024).unwrap()
    }

    #[test]
    fn test_insert_appends() {
        let list = list();
        list.insert(1).unwrap();
        list.insert(2).unwrap();
        list.insert(3).unwrap();
        assert_eq!(list.values().unwrap(), vec![1, 2, 3]);
        assert_eq!(list.count().unwrap(), 3);
    }

    #[test]
    fn test_each_node_is_one_block() {
        let list = list();
        list.insert(1).unwrap();
        list.insert(2).unwrap();
        let stats = list.pool().stats().unwrap();
        assert_eq!(stats.used_bytes, 2 * NODE_SIZE);
        assert_eq!(stats.allocation_count, 2);
    }

    #[test]
    fn test_delete_head_moves_head() {
        let list = list();
        list.insert(1).unwrap();
        let second = list.insert(2).unwrap();
        list.delete(1).unwrap();
        assert_eq!(list.head().unwrap(), Some(second));
    }

    #[test]
    fn test_missing_value() {
        let list = list();
        list.insert(1).unwrap();
        assert_eq!(list.delete(9), Err(ListError::ValueNotFound { value: 9 }));
        assert_eq!(list.search(9).unwrap(), None);
    }

    #[test]
    fn test_empty_display() {
        assert_eq!(list().display().unwrap(), "[]");
    }

    #[test]
    fn test_failed_link_releases_new_node() {
        let list = list();
        let stale = list.insert(1).unwrap();
        list.delete(1).unwrap();

        let created = list.create(2, None).unwrap();
        assert_eq!(list.pool().stats().unwrap().used_bytes, NODE_SIZE);

        let err = list.link_or_release(stale, created).unwrap_err();
        assert_eq!(err, ListError::NodeNotFound { node: stale });
        assert_eq!(list.pool().stats().unwrap().used_bytes, 0);
        assert_eq!(list.value(created), Err(ListError::NodeNotFound { node: created }));
    }

    #[test]
    fn test_deleted_node_is_rejected() {
        let list = list();
        let node = list.insert(4).unwrap();
        list.delete(4).unwrap();
        assert_eq!(list.value(node), Err(ListError::NodeNotFound { node }));
    }
}
