use super::CRCProvider;

/// Yields the words of `inner` unchanged while folding each one into the
/// running checksum.
pub(crate) struct Checksummed<'c, C, I> {
    crc_provider: &'c mut C,
    inner: I,
}

impl<'c, C, I> Checksummed<'c, C, I>
where
    C: CRCProvider,
    C::Word: Copy,
    I: Iterator<Item = C::Word>,
{
    pub fn new(crc_provider: &'c mut C, inner: I) -> Self {
        Self { crc_provider, inner }
    }

    /// Stop checksumming. The rest of `inner` is returned untouched.
    pub fn into_parts(self) -> (&'c mut C, I) {
        (self.crc_provider, self.inner)
    }
}

impl<C, I> Iterator for Checksummed<'_, C, I>
where
    C: CRCProvider,
    C::Word: Copy,
    I: Iterator<Item = C::Word>,
{
    type Item = C::Word;

    fn next(&mut self) -> Option<C::Word> {
        self.inner.next().inspect(|word| self.crc_provider.update(word))
    }
}
