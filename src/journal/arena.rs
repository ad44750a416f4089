use crate::foundation::error::RasterResult;

/// Default chunk size used by journals when none is configured.
pub const DEFAULT_CHUNK_BYTES: usize = 16 * 1024;

#[derive(Debug)]
struct Chunk<T> {
    items: Vec<T>,
}

impl<T> Chunk<T> {
    fn with_capacity(capacity: usize) -> RasterResult<Self> {
        let mut items = Vec::new();
        items.try_reserve_exact(capacity)?;
        Ok(Self { items })
    }

    fn remaining(&self) -> usize {
        self.items.capacity() - self.items.len()
    }
}

/// Chunked bump storage with bulk reset and no per-item free.
///
/// Items are placed into fixed-capacity chunks; a full chunk is never grown, a new one is linked
/// after it instead, so item addresses stay stable until [`Arena::reset`]. `reset` drops every
/// item in allocation order, frees all chunks but the first and keeps that one for reuse, so a
/// steady draw/flush cycle settles on a single retained chunk.
#[derive(Debug)]
pub struct Arena<T> {
    chunks: Vec<Chunk<T>>,
    chunk_capacity: usize,
    len: usize,
}

impl<T> Arena<T> {
    /// Arena whose default chunk holds roughly `chunk_bytes` worth of items (at least one).
    ///
    /// No memory is allocated until the first [`Arena::alloc`].
    pub fn new(chunk_bytes: usize) -> Self {
        let item = std::mem::size_of::<T>().max(1);
        Self {
            chunks: Vec::new(),
            chunk_capacity: (chunk_bytes / item).max(1),
            len: 0,
        }
    }

    /// Items per default chunk.
    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Number of live chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of allocated items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` when no item is allocated.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move `value` into the arena.
    ///
    /// Fails only with [`crate::RasterError::NoMemory`]; on failure `value` is dropped.
    pub fn alloc(&mut self, value: T) -> RasterResult<&mut T> {
        let has_room = self.chunks.last().is_some_and(|c| c.remaining() > 0);
        if !has_room {
            self.chunks.try_reserve(1)?;
            self.chunks.push(Chunk::with_capacity(self.chunk_capacity)?);
        }
        let last = self.chunks.len() - 1;
        let chunk = &mut self.chunks[last];
        chunk.items.push(value);
        self.len += 1;
        let idx = chunk.items.len() - 1;
        Ok(&mut chunk.items[idx])
    }

    /// Items in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.chunks.iter().flat_map(|c| c.items.iter())
    }

    /// Drop every item (in allocation order) and release all chunks except the first.
    ///
    /// Runs in time proportional to the number of chunks plus the cost of the items' own
    /// destructors.
    pub fn reset(&mut self) {
        if let Some(first) = self.chunks.first_mut() {
            first.items.clear();
        }
        self.chunks.truncate(1);
        self.len = 0;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/journal/arena.rs"]
mod tests;
