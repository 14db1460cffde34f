extern crate alloc;

use alloc::boxed::Box;
use alloc::fmt;
use core::mem;
use core::ptr::{self, NonNull};

/// A node in a frequency bucket.
///
/// Holds one cached pair and the links to its neighbours within the bucket.
/// Nodes are handed out as raw pointers so the cache can unlink or migrate
/// them in O(1) without walking the bucket.
pub struct Node<T> {
    /// The stored value. Uses MaybeUninit so sentinel nodes can stay empty.
    val: mem::MaybeUninit<T>,
    /// Pointer to the neighbour on the older side.
    prev: *mut Node<T>,
    /// Pointer to the neighbour on the newer side.
    next: *mut Node<T>,
}

impl<T> Node<T> {
    fn new(val: T) -> Self {
        Node {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Creates a sentinel node with no value.
    ///
    /// Each bucket owns two sentinels that bracket the real nodes.
    fn sentinel() -> Self {
        Node {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Borrows the stored value.
    ///
    /// # Safety
    ///
    /// Must only be called on a non-sentinel node, whose value is initialized.
    pub unsafe fn value(&self) -> &T {
        // SAFETY: caller guarantees this node is not a sentinel
        unsafe { self.val.assume_init_ref() }
    }

    /// Mutably borrows the stored value.
    ///
    /// # Safety
    ///
    /// Must only be called on a non-sentinel node, whose value is initialized.
    pub unsafe fn value_mut(&mut self) -> &mut T {
        // SAFETY: caller guarantees this node is not a sentinel
        unsafe { self.val.assume_init_mut() }
    }

    /// Consumes a detached node and takes ownership of its value.
    ///
    /// # Safety
    ///
    /// Must only be called on a non-sentinel node that has been unlinked from
    /// its bucket (e.g. via [`Bucket::pop_oldest`] or [`Bucket::remove`]).
    pub unsafe fn into_value(self: Box<Self>) -> T {
        // SAFETY: caller guarantees this node is not a sentinel
        unsafe { self.val.assume_init() }
    }
}

/// An insertion-ordered frequency bucket.
///
/// A doubly linked list bracketed by sentinel nodes. The oldest entry sits
/// next to the `oldest` sentinel and is the eviction candidate for the
/// bucket; new and promoted entries are appended at the newest end. This
/// gives O(1) append, O(1) unlink by node handle, and a deterministic
/// oldest-first eviction order.
///
/// Buckets carry no capacity of their own; the cache enforces its capacity
/// across all buckets.
pub struct Bucket<T> {
    /// Current number of entries in the bucket.
    len: usize,
    /// Sentinel on the oldest side.
    oldest: *mut Node<T>,
    /// Sentinel on the newest side.
    newest: *mut Node<T>,
}

impl<T> Bucket<T> {
    /// Creates an empty bucket.
    pub fn new() -> Bucket<T> {
        let oldest = Box::into_raw(Box::new(Node::sentinel()));
        let newest = Box::into_raw(Box::new(Node::sentinel()));

        // SAFETY: both sentinels are freshly allocated valid pointers
        unsafe {
            (*oldest).next = newest;
            (*newest).prev = oldest;
        }

        Bucket {
            len: 0,
            oldest,
            newest,
        }
    }

    /// Returns the number of entries in the bucket.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the bucket holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a value at the newest end and returns its node handle.
    ///
    /// The handle stays valid until the node is removed from the bucket.
    pub fn push_newest(&mut self, v: T) -> *mut Node<T> {
        // SAFETY: Box::into_raw never returns null
        let node = unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(Node::new(v)))) };
        // SAFETY: node is freshly allocated and not linked anywhere yet
        unsafe { self.link_newest(node.as_ptr()) };
        self.len += 1;
        node.as_ptr()
    }

    /// Unlinks and returns the oldest entry, or `None` if the bucket is empty.
    pub fn pop_oldest(&mut self) -> Option<Box<Node<T>>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: sentinels are valid for the lifetime of the bucket, and a
        // non-empty bucket has at least one real node between them
        let node = unsafe { (*self.oldest).next };
        if node == self.newest {
            return None;
        }
        // SAFETY: node is a real node inside this bucket
        unsafe { self.unlink(node) };
        self.len -= 1;
        // SAFETY: node was allocated by Box::into_raw and is now detached
        Some(unsafe { Box::from_raw(node) })
    }

    /// Unlinks the given node from the bucket and returns it.
    ///
    /// # Safety
    ///
    /// `node` must be a valid pointer to a non-sentinel node that is
    /// currently linked into *this* bucket.
    pub unsafe fn remove(&mut self, node: *mut Node<T>) -> Option<Box<Node<T>>> {
        if self.is_empty() || node.is_null() || node == self.oldest || node == self.newest {
            return None;
        }
        // SAFETY: caller guarantees node is linked into this bucket
        unsafe { self.unlink(node) };
        self.len -= 1;
        // SAFETY: node was allocated by Box::into_raw and is now detached
        Some(unsafe { Box::from_raw(node) })
    }

    /// Appends a node detached from another bucket at the newest end.
    ///
    /// Used when an entry is promoted to the next frequency bucket: the node
    /// keeps its allocation and becomes the newest entry of its new bucket.
    ///
    /// # Safety
    ///
    /// `node` must be a valid pointer to a non-sentinel node that is not
    /// linked into any bucket.
    pub unsafe fn adopt_newest(&mut self, node: *mut Node<T>) {
        // SAFETY: caller guarantees node is valid and detached
        unsafe { self.link_newest(node) };
        self.len += 1;
    }

    /// Links a node just before the newest sentinel.
    ///
    /// # Safety
    ///
    /// `node` must be valid and not currently linked into any bucket.
    unsafe fn link_newest(&mut self, node: *mut Node<T>) {
        // SAFETY: the newest sentinel and its prev pointer are always valid,
        // and the caller guarantees node is valid and detached
        unsafe {
            (*node).next = self.newest;
            (*node).prev = (*self.newest).prev;
            (*(*node).prev).next = node;
            (*self.newest).prev = node;
        }
    }

    /// Unlinks a node from its neighbours without deallocating it.
    ///
    /// # Safety
    ///
    /// `node` must be a valid non-sentinel node linked into this bucket,
    /// which implies its prev and next pointers are valid.
    unsafe fn unlink(&mut self, node: *mut Node<T>) {
        // SAFETY: guaranteed by the caller's contract
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    /// Removes and drops every entry in the bucket.
    pub fn clear(&mut self) {
        while let Some(node) = self.pop_oldest() {
            // SAFETY: pop_oldest only yields detached non-sentinel nodes
            drop(unsafe { node.into_value() });
        }
    }
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Bucket::new()
    }
}

impl<T> Drop for Bucket<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the sentinels were allocated in `new` and are only freed here
        unsafe {
            drop(Box::from_raw(self.oldest));
            drop(Box::from_raw(self.newest));
        }
        self.oldest = ptr::null_mut();
        self.newest = ptr::null_mut();
    }
}

impl<T: fmt::Debug> fmt::Debug for Bucket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;

    fn drain<T>(bucket: &mut Bucket<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(node) = bucket.pop_oldest() {
            out.push(unsafe { node.into_value() });
        }
        out
    }

    #[test]
    fn test_push_and_pop_order() {
        let mut bucket = Bucket::new();
        bucket.push_newest(1);
        bucket.push_newest(2);
        bucket.push_newest(3);
        assert_eq!(bucket.len(), 3);

        // Oldest-first: the first value pushed comes out first.
        assert_eq!(drain(&mut bucket), [1, 2, 3]);
        assert!(bucket.is_empty());
    }

    #[test]
    fn test_pop_empty() {
        let mut bucket = Bucket::<u32>::new();
        assert!(bucket.pop_oldest().is_none());
        assert_eq!(bucket.len(), 0);
    }

    #[test]
    fn test_remove_by_handle() {
        let mut bucket = Bucket::new();
        let _a = bucket.push_newest(10);
        let b = bucket.push_newest(20);
        let _c = bucket.push_newest(30);

        let node = unsafe { bucket.remove(b) }.unwrap();
        assert_eq!(unsafe { node.into_value() }, 20);
        assert_eq!(bucket.len(), 2);
        assert_eq!(drain(&mut bucket), [10, 30]);
    }

    #[test]
    fn test_remove_null_is_rejected() {
        let mut bucket = Bucket::<u32>::new();
        bucket.push_newest(1);
        assert!(unsafe { bucket.remove(ptr::null_mut()) }.is_none());
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn test_adopt_moves_between_buckets() {
        let mut from = Bucket::new();
        let mut to = Bucket::new();
        let a = from.push_newest(1);
        from.push_newest(2);
        to.push_newest(9);

        let detached = unsafe { from.remove(a) }.unwrap();
        unsafe { to.adopt_newest(Box::into_raw(detached)) };

        assert_eq!(from.len(), 1);
        assert_eq!(to.len(), 2);
        // The adopted node lands at the newest end of its new bucket.
        assert_eq!(drain(&mut to), [9, 1]);
        assert_eq!(drain(&mut from), [2]);
    }

    #[test]
    fn test_value_accessors() {
        let mut bucket = Bucket::new();
        let node = bucket.push_newest(String::from("one"));
        unsafe {
            assert_eq!((*node).value(), "one");
            (*node).value_mut().push_str("_more");
            assert_eq!((*node).value(), "one_more");
        }
    }

    #[test]
    fn test_clear_and_reuse() {
        let mut bucket = Bucket::new();
        bucket.push_newest(String::from("a"));
        bucket.push_newest(String::from("b"));
        bucket.clear();
        assert!(bucket.is_empty());

        bucket.push_newest(String::from("c"));
        assert_eq!(drain(&mut bucket), ["c"]);
    }
}
