//! Free-list object pool
//!
//! Messages and writers are acquired from a [`Pool`] for every record and
//! returned once the record is committed, so a process under steady logging
//! load stops allocating after warm-up.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Objects that can be cleared before going back to a pool.
///
/// `reset` must drop every reference to caller data (loggers, sinks, strings
/// borrowed from the previous record) while keeping allocated capacity.
pub trait Reusable {
    fn reset(&mut self);
}

impl<T: Reusable + ?Sized> Reusable for Box<T> {
    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Concurrent free list with acquire-reset-release discipline.
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
    capacity: usize,
    allocated: AtomicUsize,
    reused: AtomicUsize,
}

impl<T: Reusable> Pool<T> {
    /// Create a pool keeping at most `capacity` idle objects.
    pub const fn new(capacity: usize) -> Self {
        Self {
            free: parking_lot::const_mutex(Vec::new()),
            capacity,
            allocated: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
        }
    }

    /// Take an idle object, or build one with `make` on a pool miss.
    pub fn acquire_with(&self, make: impl FnOnce() -> T) -> T {
        if let Some(item) = self.free.lock().pop() {
            self.reused.fetch_add(1, Ordering::Relaxed);
            return item;
        }
        self.allocated.fetch_add(1, Ordering::Relaxed);
        make()
    }

    /// Reset `item` and return it to the free list.
    ///
    /// Objects beyond the pool capacity are dropped.
    pub fn release(&self, mut item: T) {
        item.reset();
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(item);
        }
    }

    /// Number of objects created because the free list was empty.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Number of acquisitions served from the free list.
    #[inline]
    pub fn reused(&self) -> usize {
        self.reused.load(Ordering::Relaxed)
    }

    /// Number of objects currently waiting in the free list.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity)
            .field("allocated", &self.allocated.load(Ordering::Relaxed))
            .field("reused", &self.reused.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct Buffer {
        data: Vec<u8>,
    }

    impl Reusable for Buffer {
        fn reset(&mut self) {
            self.data.clear();
        }
    }

    #[test]
    fn test_acquire_release_reuses_object() {
        let pool: Pool<Buffer> = Pool::new(4);

        for i in 0..1000u32 {
            let mut buf = pool.acquire_with(Buffer::default);
            assert!(buf.data.is_empty());
            buf.data.extend_from_slice(&i.to_le_bytes());
            pool.release(buf);
        }

        assert_eq!(pool.allocated(), 1);
        assert_eq!(pool.reused(), 999);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_capacity_bounds_idle_objects() {
        let pool: Pool<Buffer> = Pool::new(2);
        let items: Vec<Buffer> = (0..5).map(|_| pool.acquire_with(Buffer::default)).collect();
        for item in items {
            pool.release(item);
        }
        assert_eq!(pool.allocated(), 5);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_release_resets_contents() {
        let pool: Pool<Buffer> = Pool::new(1);
        let mut buf = pool.acquire_with(Buffer::default);
        buf.data.extend_from_slice(b"stale");
        pool.release(buf);

        let buf = pool.acquire_with(Buffer::default);
        assert!(buf.data.is_empty());
        assert!(buf.data.capacity() >= 5);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool: Arc<Pool<Buffer>> = Arc::new(Pool::new(64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let buf = pool.acquire_with(Buffer::default);
                        pool.release(buf);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // At most one live object per thread at any moment
        assert!(pool.allocated() <= 8);
        assert_eq!(pool.allocated() + pool.reused(), 8 * 500);
    }
}
