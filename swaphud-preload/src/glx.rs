// GLX/Xlib glue
//
// Entry points are looked up at run time in the host's global symbol scope
// (libGL and libX11 are already loaded by the time a frame is presented), so
// the library itself links against neither.
use libloading::os::unix::Library;
use std::ffi::{c_int, c_uchar, c_uint, c_ulong, c_void, CStr, CString};
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};
use swaphud_core::error::BootstrapError;
use swaphud_core::graphics::GlowBackend;
use swaphud_core::intercept::{PresentSurface, SymbolResolver};

/// glibc's `RTLD_NEXT` pseudo-handle.
const RTLD_NEXT: *mut c_void = -1isize as *mut c_void;

type XGetGeometryFn = unsafe extern "C" fn(
    display: *mut c_void,
    drawable: c_ulong,
    root: *mut c_ulong,
    x: *mut c_int,
    y: *mut c_int,
    width: *mut c_uint,
    height: *mut c_uint,
    border_width: *mut c_uint,
    depth: *mut c_uint,
) -> c_int;
type GetProcAddressFn = unsafe extern "C" fn(name: *const c_uchar) -> *const c_void;
type GetCurrentContextFn = unsafe extern "C" fn() -> *mut c_void;

/// `dlsym(RTLD_NEXT, name)`: the definition after this library's own.
pub struct NextInSearchOrder;

impl SymbolResolver for NextInSearchOrder {
    fn resolve_next(&self, name: &CStr) -> Option<NonNull<c_void>> {
        // SAFETY: RTLD_NEXT is a pseudo-handle; it must never be dlclose'd.
        let next = ManuallyDrop::new(unsafe { Library::from_raw(RTLD_NEXT) });
        let symbol = unsafe { next.get::<*mut c_void>(name.to_bytes_with_nul()) }.ok()?;
        NonNull::new(*symbol)
    }
}

/// Look `name` (nul-terminated) up in the process's global scope.
///
/// # Safety
/// `T` must match the symbol's actual type.
unsafe fn global_symbol<T: Copy>(name: &[u8]) -> Option<T> {
    let this = Library::this();
    let symbol = this.get::<T>(name).ok()?;
    Some(*symbol)
}

/// The display and drawable passed to one `glXSwapBuffers` call.
pub struct GlxSurface {
    display: *mut c_void,
    drawable: c_ulong,
}

impl GlxSurface {
    pub fn new(display: *mut c_void, drawable: c_ulong) -> Self {
        Self { display, drawable }
    }
}

impl PresentSurface for GlxSurface {
    type Backend = GlowBackend;

    fn drawable_size(&self) -> Option<(u32, u32)> {
        if self.display.is_null() || self.drawable == 0 {
            return None;
        }
        let get_geometry = unsafe { global_symbol::<XGetGeometryFn>(b"XGetGeometry\0") }?;

        let mut root: c_ulong = 0;
        let (mut x, mut y): (c_int, c_int) = (0, 0);
        let (mut width, mut height, mut border, mut depth): (c_uint, c_uint, c_uint, c_uint) =
            (0, 0, 0, 0);
        // SAFETY: display and drawable come straight from the host's call.
        let status = unsafe {
            get_geometry(
                self.display,
                self.drawable,
                &mut root,
                &mut x,
                &mut y,
                &mut width,
                &mut height,
                &mut border,
                &mut depth,
            )
        };
        (status != 0).then_some((width, height))
    }

    fn create_backend(&self) -> Result<GlowBackend, BootstrapError> {
        let current_context =
            unsafe { global_symbol::<GetCurrentContextFn>(b"glXGetCurrentContext\0") }
                .ok_or_else(|| {
                    BootstrapError::BackendUnavailable("glXGetCurrentContext not found".into())
                })?;
        if unsafe { current_context() }.is_null() {
            return Err(BootstrapError::BackendUnavailable(
                "no GLX context is current".into(),
            ));
        }

        let get_proc_address =
            unsafe { global_symbol::<GetProcAddressFn>(b"glXGetProcAddressARB\0") };
        let this = Library::this();
        let loader = |name: &str| -> *const c_void {
            let Ok(name) = CString::new(name) else {
                return ptr::null();
            };
            if let Some(get_proc_address) = get_proc_address {
                let address = unsafe { get_proc_address(name.as_ptr().cast()) };
                if !address.is_null() {
                    return address;
                }
            }
            unsafe { this.get::<*const c_void>(name.as_bytes_with_nul()) }
                .map(|symbol| *symbol)
                .unwrap_or(ptr::null())
        };

        log::debug!(
            "Loading GL through {}",
            if get_proc_address.is_some() {
                "glXGetProcAddressARB"
            } else {
                "the global symbol scope"
            }
        );
        // SAFETY: a context is current on this thread (checked above) and the
        // loader returns entry points for it.
        Ok(unsafe { GlowBackend::from_loader(loader) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_display_has_no_size() {
        let surface = GlxSurface::new(ptr::null_mut(), 42);
        assert_eq!(surface.drawable_size(), None);
    }

    #[test]
    fn resolves_libc_symbols_after_this_object() {
        // Nothing in this test binary defines `getpid` itself, so the next
        // definition is libc's.
        assert!(NextInSearchOrder.resolve_next(c"getpid").is_some());
        assert!(NextInSearchOrder
            .resolve_next(c"swaphud_symbol_that_does_not_exist")
            .is_none());
    }
}
