/// Runtime handle
///
/// Opaque reference to a live JavaScript engine instance owned by the host.
/// The handle only borrows the engine: it carries the lifetime of the host
/// borrow it was read from, so it cannot be kept past the install call.

use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroUsize;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RuntimeHandle<'a> {
    raw: NonZeroUsize,
    _borrow: PhantomData<&'a ()>,
}

impl<'a> RuntimeHandle<'a> {
    /// Wrap a raw handle value read from the host
    ///
    /// Returns `None` for zero, which hosts use to signal that no runtime is
    /// attached.
    ///
    /// # Safety
    /// `raw` must be zero or the address of an engine instance that stays
    /// alive for `'a`. Installers are allowed to dereference it.
    pub unsafe fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(|raw| Self {
            raw,
            _borrow: PhantomData,
        })
    }

    /// The raw address as handed over by the host
    pub fn get(&self) -> usize {
        self.raw.get()
    }
}

impl fmt::Debug for RuntimeHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuntimeHandle({:#x})", self.raw.get())
    }
}
