use crate::error::Overflow;

/// Ring buffer staging received bytes until they form a frame.
///
/// Bytes enter either through [`ingest`](Self::ingest) or by reading
/// straight into [`spare_mut`](Self::spare_mut) followed by
/// [`commit`](Self::commit). Parsers walk the staged bytes with a
/// [`Cursor`] and release what they consumed with [`flush`](Self::flush).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandBuffer<const N: usize> {
    buf: [u8; N],
    start: usize,
    size: usize,
}

impl<const N: usize> Default for CommandBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CommandBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            start: 0,
            size: 0,
        }
    }

    /// Stage incoming bytes.
    ///
    /// Bytes are stored until the buffer is full; the remainder is
    /// dropped and reported as [`Overflow`].
    pub fn ingest<'a>(&mut self, src: impl IntoIterator<Item = &'a u8>) -> Result<(), Overflow> {
        src.into_iter().try_for_each(|&byte| {
            if self.is_full() {
                Err(Overflow)?;
            }

            let end = self.end();
            self.buf[end] = byte;
            self.size += 1;

            Ok(())
        })
    }

    /// The contiguous free region after the staged bytes.
    ///
    /// May be shorter than the total free space when the region wraps.
    /// Empty only when the buffer is full.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let end = self.end();
        let stop = if self.is_full() {
            end
        } else if end >= self.start {
            N
        } else {
            self.start
        };

        &mut self.buf[end..stop]
    }

    /// Mark `count` bytes written into [`spare_mut`](Self::spare_mut)
    /// as staged.
    pub fn commit(&mut self, count: usize) {
        debug_assert!(count <= N - self.size);
        self.size = (self.size + count).min(N);
    }

    /// Release the bytes a cursor has walked over.
    pub fn flush(&mut self, Consumed(count): Consumed) {
        let count = count.min(self.size);
        self.start = Self::wrap(self.start + count);
        self.size -= count;
    }

    /// Drop every staged byte.
    pub fn clear(&mut self) {
        self.start = 0;
        self.size = 0;
    }

    /// Walk the staged bytes from the oldest.
    pub fn cursor(&self) -> Cursor<'_, N> {
        Cursor {
            parent: self,
            count: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.size == N
    }

    #[inline]
    fn wrap(cursor: usize) -> usize {
        cursor % N
    }

    /// Position one past the newest staged byte.
    #[inline]
    fn end(&self) -> usize {
        Self::wrap(self.start + self.size)
    }
}

/// Number of bytes a [`Cursor`] has yielded, handed back to
/// [`CommandBuffer::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumed(usize);

/// Reading cursor over a [`CommandBuffer`].
pub struct Cursor<'a, const N: usize> {
    parent: &'a CommandBuffer<N>,
    count: usize,
}

impl<const N: usize> Cursor<'_, N> {
    /// How far the cursor has advanced.
    #[inline]
    pub fn consumed(&self) -> Consumed {
        Consumed(self.count)
    }
}

impl<const N: usize> Iterator for Cursor<'_, N> {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.count >= self.parent.size {
            return None;
        }

        let byte = self.parent.buf[CommandBuffer::<N>::wrap(self.parent.start + self.count)];
        self.count += 1;

        Some(byte)
    }
}
