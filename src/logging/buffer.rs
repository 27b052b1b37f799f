//! Reusable byte buffers for assembling records
//!
//! A record is built in one pooled buffer and handed to the writers as a
//! single slice. The guard returns the buffer on drop, so every exit path
//! (including unwinding) releases it.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// Initial capacity of a freshly allocated buffer
const INITIAL_CAPACITY: usize = 256;

/// Thread-safe pool of byte buffers
#[derive(Debug)]
pub struct BufferPool {
    /// Idle buffers ready for reuse
    free: Mutex<Vec<Vec<u8>>>,
    /// Maximum idle buffers kept
    max_pooled: usize,
    /// Buffers that grew beyond this are dropped instead of pooled
    max_capacity: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(64, 64 * 1024)
    }
}

impl BufferPool {
    /// Create a pool with the given retention limits
    pub fn new(max_pooled: usize, max_capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_pooled)),
            max_pooled,
            max_capacity,
        }
    }

    /// Take an empty buffer from the pool, allocating if none is idle
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .free
            .lock()
            .ok()
            .and_then(|mut free| free.pop())
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));

        PooledBuffer { buf, pool: self }
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > self.max_capacity {
            return;
        }
        buf.clear();
        if let Ok(mut free) = self.free.lock() {
            if free.len() < self.max_pooled {
                free.push(buf);
            }
        }
    }

    /// Number of idle buffers
    pub fn idle(&self) -> usize {
        self.free.lock().map(|f| f.len()).unwrap_or(0)
    }
}

/// Buffer on loan from a `BufferPool`
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl PooledBuffer<'_> {
    /// Append a number as exactly two decimal digits
    pub fn push_two_digits(&mut self, n: u32) {
        self.buf.push(b'0' + ((n / 10) % 10) as u8);
        self.buf.push(b'0' + (n % 10) as u8);
    }

    /// Append a number in decimal without allocating
    pub fn push_decimal(&mut self, mut n: u32) {
        let mut tmp = [0u8; 10];
        let mut i = tmp.len();
        loop {
            i -= 1;
            tmp[i] = b'0' + (n % 10) as u8;
            n /= 10;
            if n == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&tmp[i..]);
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_buffer_returned_on_drop() {
        let pool = BufferPool::new(4, 1024);
        assert_eq!(pool.idle(), 0);
        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"hello");
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty(), "reused buffer must be cleared");
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_buffer_returned_on_unwind() {
        let pool = BufferPool::new(4, 1024);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut buf = pool.acquire();
            buf.push(b'x');
            panic!("formatting failed");
        }));
        assert!(result.is_err());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_oversized_buffer_not_pooled() {
        let pool = BufferPool::new(4, 16);
        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(&[b'a'; 1024]);
        }
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_pool_capacity_limit() {
        let pool = BufferPool::new(2, 1024);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
            let _c = pool.acquire();
        }
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_digit_helpers() {
        let pool = BufferPool::default();
        let mut buf = pool.acquire();
        buf.push_two_digits(7);
        buf.push(b':');
        buf.push_two_digits(42);
        buf.push(b' ');
        buf.push_decimal(0);
        buf.push(b' ');
        buf.push_decimal(1234567);
        assert_eq!(buf.as_slice(), b"07:42 0 1234567");
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = BufferPool::new(8, 1024);
        std::thread::scope(|s| {
            for t in 0..8 {
                let pool = &pool;
                s.spawn(move || {
                    for i in 0..500 {
                        let mut buf = pool.acquire();
                        write!(&mut *buf, "{}-{}", t, i).unwrap();
                        assert_eq!(buf.as_slice(), format!("{}-{}", t, i).as_bytes());
                    }
                });
            }
        });
        assert!(pool.idle() <= 8);
    }
}
