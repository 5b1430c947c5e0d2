//! Native extension loaded from a shared library.
//!
//! The library exports four C functions, each name prefixed with the
//! configured symbol prefix (`svcbridge_` by default):
//!
//! - `runtime_new() -> *mut c_void`
//! - `runtime_free(*mut c_void)`
//! - `call_function(rt, service, function, args_json, *mut c_int status) -> *mut c_char`
//! - `string_free(*mut c_char)`
//!
//! `call_function` returns a NUL-terminated string owned by the library.
//! With status `0` it is the JSON result, otherwise an error message.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::path::Path;

use libloading::{Library, Symbol};

use svcbridge_types::{CallValue, ExecutionError};

use super::NativeModule;

type RuntimeNewFn = unsafe extern "C" fn() -> *mut c_void;
type RuntimeFreeFn = unsafe extern "C" fn(*mut c_void);
type CallFunctionFn = unsafe extern "C" fn(
    *mut c_void,
    *const c_char,
    *const c_char,
    *const c_char,
    *mut c_int,
) -> *mut c_char;
type StringFreeFn = unsafe extern "C" fn(*mut c_char);

/// A runtime handle inside a loaded extension library.
pub struct DylibModule {
    runtime: *mut c_void,
    runtime_free: RuntimeFreeFn,
    call_function: CallFunctionFn,
    string_free: StringFreeFn,
    // Must outlive the function pointers above; fields drop after `Drop::drop`.
    _library: Library,
}

impl DylibModule {
    /// Load the library, resolve all entry points and create a runtime.
    ///
    /// Any failure means the extension is not usable here; the message says why.
    pub fn load(path: &Path, symbol_prefix: &str) -> Result<Self, String> {
        if !path.exists() {
            return Err(format!("native library not found: {}", path.display()));
        }

        // SAFETY: loading runs the library's initialisers. The path comes from
        // the user's own configuration.
        let library = unsafe { Library::new(path) }
            .map_err(|e| format!("failed to load {}: {}", path.display(), e))?;

        Self::from_library(library, symbol_prefix)
    }

    /// Resolve the entry points in an already loaded library and create a runtime.
    pub fn from_library(library: Library, symbol_prefix: &str) -> Result<Self, String> {
        // SAFETY: the signatures match the extension ABI documented above.
        let (runtime_new, runtime_free, call_function, string_free) = unsafe {
            (
                resolve::<RuntimeNewFn>(&library, symbol_prefix, "runtime_new")?,
                resolve::<RuntimeFreeFn>(&library, symbol_prefix, "runtime_free")?,
                resolve::<CallFunctionFn>(&library, symbol_prefix, "call_function")?,
                resolve::<StringFreeFn>(&library, symbol_prefix, "string_free")?,
            )
        };

        // SAFETY: resolved from the library above, which is still loaded.
        let runtime = unsafe { runtime_new() };
        if runtime.is_null() {
            return Err(format!("{}runtime_new returned null", symbol_prefix));
        }

        Ok(Self {
            runtime,
            runtime_free,
            call_function,
            string_free,
            _library: library,
        })
    }
}

/// Look up `<prefix><name>` and copy the function pointer out.
unsafe fn resolve<T: Copy>(library: &Library, prefix: &str, name: &str) -> Result<T, String> {
    let full = format!("{}{}", prefix, name);
    let symbol: Symbol<T> = library
        .get(full.as_bytes())
        .map_err(|e| format!("missing symbol {}: {}", full, e))?;
    Ok(*symbol)
}

fn c_string(value: &str, what: &str) -> Result<CString, ExecutionError> {
    CString::new(value)
        .map_err(|_| ExecutionError::InvalidArguments(format!("{} contains null bytes", what)))
}

impl NativeModule for DylibModule {
    fn call_function(
        &self,
        service_name: &str,
        function_name: &str,
        args: &[CallValue],
    ) -> Result<CallValue, ExecutionError> {
        let service = c_string(service_name, "service name")?;
        let function = c_string(function_name, "function name")?;
        let args_json = serde_json::to_string(args)
            .map_err(|e| ExecutionError::InvalidArguments(e.to_string()))?;
        let args_json = c_string(&args_json, "arguments")?;

        let mut status: c_int = 0;
        // SAFETY: `runtime` is live until drop, and every string pointer is valid
        // and NUL-terminated for the duration of the call.
        let raw = unsafe {
            (self.call_function)(
                self.runtime,
                service.as_ptr(),
                function.as_ptr(),
                args_json.as_ptr(),
                &mut status,
            )
        };

        if raw.is_null() {
            return Err(ExecutionError::Remote(format!(
                "native call returned no result (status {})",
                status
            )));
        }

        // SAFETY: non-null strings from `call_function` are NUL-terminated and
        // owned by the library until handed back to `string_free`.
        let text = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        unsafe { (self.string_free)(raw) };

        if status != 0 {
            return Err(ExecutionError::Remote(text));
        }

        serde_json::from_str(&text).map_err(|e| {
            ExecutionError::MalformedResponse(format!("native result is not JSON: {}", e))
        })
    }
}

impl Drop for DylibModule {
    fn drop(&mut self) {
        // SAFETY: created by `runtime_new` in `load` and freed exactly once.
        unsafe { (self.runtime_free)(self.runtime) };
    }
}
