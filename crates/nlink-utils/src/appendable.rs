use thiserror::Error;

/// Misuse and allocation failures surfaced by [`Appendable`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer allocation failed")]
    AllocFailed,
    #[error("buffer not allocated")]
    NotAllocated,
    #[error("shrink({0}) exceeds current length")]
    Underflow(usize),
}

/// Default growth granularity in bytes when a caller doesn't pick one.
pub const DEFAULT_ROUND: usize = 256;

/// An owned, resizable byte buffer reused across message fields.
///
/// `capacity` is always a multiple of `round`; `length` is the size of the
/// active prefix `[0..length)`. Growth doubles the existing capacity (or
/// rounds up to fit the new length, whichever is larger), so a buffer that
/// has already grown to handle a big payload won't reallocate on every
/// subsequent append of a similar size. The buffer is reused across
/// [`reset`](Appendable::reset) calls rather than freed, which is the whole
/// point: hot receive loops parse thousands of frames a second and can't
/// afford a `malloc` per field.
#[derive(Debug, Clone)]
pub struct Appendable {
    // Invariant: storage.len() == capacity at all times; `length` tracks the
    // logical prefix within it. Resizing storage (not just its capacity)
    // keeps the backing allocation's size exact and inspectable without
    // unsafe pointer arithmetic.
    storage: Vec<u8>,
    length: usize,
    round: usize,
}

impl Appendable {
    /// Creates an empty, unallocated buffer with the given growth granularity.
    pub fn new(round: usize) -> Self {
        Self { storage: Vec::new(), length: 0, round: round.max(1) }
    }

    /// Allocates `round_up(cap, round)` bytes and resets `length` to 0.
    pub fn init(&mut self, cap: usize) -> Result<(), BufferError> {
        let target = round_up(cap, self.round);
        self.grow_to(target)?;
        self.length = 0;
        Ok(())
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Appends `bytes` to the active prefix, growing the buffer if needed.
    /// A no-op when `bytes` is empty.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        if bytes.is_empty() {
            return Ok(());
        }

        let needed = self.length + bytes.len();
        if needed > self.capacity() {
            let doubled = self.capacity().saturating_mul(2);
            let rounded = round_up(needed, self.round);
            self.grow_to(doubled.max(rounded))?;
        }

        self.storage[self.length..needed].copy_from_slice(bytes);
        self.length = needed;
        Ok(())
    }

    /// Drops the last `k` bytes of the active prefix without releasing memory.
    pub fn shrink(&mut self, k: usize) -> Result<(), BufferError> {
        if k > self.length {
            return Err(BufferError::Underflow(k));
        }
        self.length -= k;
        Ok(())
    }

    /// Sets `length` to 0 without releasing the backing allocation.
    pub fn reset(&mut self) -> Result<(), BufferError> {
        if self.capacity() == 0 {
            return Err(BufferError::NotAllocated);
        }
        self.length = 0;
        Ok(())
    }

    /// Equivalent to `reset` followed by `append`, allocating on first use.
    pub fn copy(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        if self.capacity() == 0 {
            self.init(bytes.len())?;
        } else {
            self.reset()?;
        }
        self.append(bytes)
    }

    /// Grows the buffer by `n` bytes and hands the uninitialised (zeroed)
    /// tail to `fill`, advancing `length` only if `fill` succeeds.
    ///
    /// Lets a reader fill a field's bytes directly from a transport into
    /// the buffer's own storage, with no intermediate scratch `Vec` for the
    /// wire bytes to pass through.
    pub fn append_filled<F, E>(&mut self, n: usize, fill: F) -> Result<(), E>
    where
        F: FnOnce(&mut [u8]) -> Result<(), E>,
        E: From<BufferError>,
    {
        if n == 0 {
            return Ok(());
        }

        let needed = self.length + n;
        if needed > self.capacity() {
            let doubled = self.capacity().saturating_mul(2);
            let rounded = round_up(needed, self.round);
            self.grow_to(doubled.max(rounded))?;
        }

        fill(&mut self.storage[self.length..needed])?;
        self.length = needed;
        Ok(())
    }

    /// The active prefix, or `None` when `length == 0`.
    pub fn body(&self) -> Option<&[u8]> {
        if self.length == 0 { None } else { Some(&self.storage[..self.length]) }
    }

    /// Releases the backing allocation. Idempotent.
    pub fn free(&mut self) {
        self.storage = Vec::new();
        self.length = 0;
    }

    fn grow_to(&mut self, target: usize) -> Result<(), BufferError> {
        if target <= self.capacity() {
            return Ok(());
        }
        let additional = target - self.storage.len();
        self.storage.try_reserve_exact(additional).map_err(|_| BufferError::AllocFailed)?;
        self.storage.resize(target, 0);
        crate::safe_assert_eq!(self.storage.len() % self.round, 0);
        Ok(())
    }
}

impl Default for Appendable {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND)
    }
}

fn round_up(n: usize, round: usize) -> usize {
    if round == 0 { n } else { n.div_ceil(round) * round }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_rounds_capacity_up() {
        let mut a = Appendable::new(256);
        a.init(10).unwrap();
        assert_eq!(a.capacity(), 256);
        assert_eq!(a.length(), 0);
        assert!(a.body().is_none());
    }

    #[test]
    fn append_grows_and_tracks_length() {
        let mut a = Appendable::new(8);
        a.append(b"hello").unwrap();
        assert_eq!(a.body(), Some(&b"hello"[..]));
        assert_eq!(a.capacity() % a.round(), 0);

        a.append(b" world").unwrap();
        assert_eq!(a.body(), Some(&b"hello world"[..]));
        assert_eq!(a.capacity() % a.round(), 0);
        assert!(a.capacity() >= a.length());
    }

    #[test]
    fn append_empty_is_noop() {
        let mut a = Appendable::new(8);
        a.append(b"x").unwrap();
        let cap_before = a.capacity();
        a.append(b"").unwrap();
        assert_eq!(a.capacity(), cap_before);
        assert_eq!(a.body(), Some(&b"x"[..]));
    }

    #[test]
    fn shrink_underflow_is_rejected() {
        let mut a = Appendable::new(8);
        a.append(b"ab").unwrap();
        assert_eq!(a.shrink(5), Err(BufferError::Underflow(5)));
        a.shrink(1).unwrap();
        assert_eq!(a.body(), Some(&b"a"[..]));
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut a = Appendable::new(8);
        a.append(b"data").unwrap();
        let cap = a.capacity();
        a.reset().unwrap();
        assert_eq!(a.capacity(), cap);
        assert!(a.body().is_none());
    }

    #[test]
    fn reset_without_allocation_fails() {
        let mut a = Appendable::new(8);
        assert_eq!(a.reset(), Err(BufferError::NotAllocated));
    }

    #[test]
    fn copy_replaces_contents() {
        let mut a = Appendable::new(8);
        a.append(b"first").unwrap();
        a.copy(b"second value").unwrap();
        assert_eq!(a.body(), Some(&b"second value"[..]));
    }

    #[test]
    fn append_filled_writes_into_own_storage() {
        let mut a = Appendable::new(8);
        a.append(b"hi-").unwrap();
        a.append_filled::<_, BufferError>(4, |dst| {
            dst.copy_from_slice(b"rest");
            Ok(())
        })
        .unwrap();
        assert_eq!(a.body(), Some(&b"hi-rest"[..]));
    }

    #[test]
    fn append_filled_rejects_without_advancing_length() {
        let mut a = Appendable::new(8);
        a.append(b"hi").unwrap();
        let err = a.append_filled::<_, BufferError>(4, |_| Err(BufferError::Underflow(4)));
        assert_eq!(err, Err(BufferError::Underflow(4)));
        assert_eq!(a.body(), Some(&b"hi"[..]));
    }

    #[test]
    fn free_releases_then_reallocates_on_append() {
        let mut a = Appendable::new(8);
        a.append(b"data").unwrap();
        a.free();
        assert_eq!(a.capacity(), 0);
        assert!(a.body().is_none());

        a.append(b"again").unwrap();
        assert_eq!(a.body(), Some(&b"again"[..]));
    }
}
