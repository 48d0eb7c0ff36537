//! Original-symbol resolution
//!
//! The interposed entry point must forward to the definition it shadows.
//! That address is looked up through a [`SymbolResolver`] the first time it is
//! needed and cached for the rest of the process, including a failed lookup.

use std::ffi::{c_void, CStr};
use std::ptr::NonNull;
use std::sync::OnceLock;

/// Finds the next definition of a symbol after the calling object in the
/// dynamic linker's search order.
pub trait SymbolResolver {
    fn resolve_next(&self, name: &CStr) -> Option<NonNull<c_void>>;
}

/// Lazily resolved, process-lifetime address of a shadowed function.
pub struct OriginalSymbol {
    name: &'static CStr,
    // Stored as an integer so the cache can live in a `static`.
    address: OnceLock<Option<usize>>,
}

impl OriginalSymbol {
    pub const fn new(name: &'static CStr) -> Self {
        Self {
            name,
            address: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static CStr {
        self.name
    }

    /// Whether a lookup has already happened, successful or not.
    pub fn is_resolved(&self) -> bool {
        self.address.get().is_some()
    }

    /// The cached address, resolving it through `resolver` on first use.
    ///
    /// Later calls never consult a resolver again.
    pub fn address(&self, resolver: &dyn SymbolResolver) -> Option<NonNull<c_void>> {
        let cached = self.address.get_or_init(|| {
            let found = resolver.resolve_next(self.name);
            match found {
                Some(ptr) => log::debug!("Resolved original {:?} at {:p}", self.name, ptr),
                None => log::error!(
                    "Could not resolve original {:?}; calls cannot be forwarded",
                    self.name
                ),
            }
            found.map(|ptr| ptr.as_ptr() as usize)
        });
        cached.and_then(|raw| NonNull::new(raw as *mut c_void))
    }
}
