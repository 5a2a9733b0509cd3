//! C FFI bindings for equip-insight.
//!
//! Exposes the analysis pipeline via a JSON-in / JSON-out C interface, so a
//! non-Rust host calls the same engine instead of re-deriving the numbers.
//!
//! # Design
//!
//! - **Owned strings**: results are heap-allocated, NUL-terminated UTF-8;
//!   release them with `equip_string_free`
//! - **Null on failure**: every entry point returns null on error
//! - **Thread-local error message**: `equip_last_error()`
//! - **`catch_unwind`**: all FFI entry points wrapped to prevent panic propagation
//!
//! # Safety
//!
//! All functions use `catch_unwind` to prevent panics from crossing the FFI boundary.
//! Null input pointers are reported through `equip_last_error()`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic;
use std::ptr;

use tracing::warn;

use crate::error::InsightError;
use crate::summary::{analyze_csv, analyze_json, SummaryConfig};

// ── Error handling ────────────────────────────────────────────────────

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg).ok();
    });
}

/// Returns the last error message, or null if no error.
/// The returned string is valid until the next FFI call on this thread.
///
/// # Safety
/// The caller must not free the returned pointer.
#[no_mangle]
pub extern "C" fn equip_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| {
        let borrow = cell.borrow();
        match borrow.as_ref() {
            Some(cstr) => cstr.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn equip_clear_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Returns the library version string.
///
/// # Safety
/// The returned string is a static string literal. Do not free it.
#[no_mangle]
pub extern "C" fn equip_version() -> *const c_char {
    c"0.1.0".as_ptr()
}

// ── String marshalling ───────────────────────────────────────────────

/// Borrows a C string as UTF-8.
///
/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("null {what} pointer"));
    }
    let c_str = unsafe { CStr::from_ptr(ptr) };
    c_str
        .to_str()
        .map_err(|e| format!("invalid UTF-8 in {what}: {e}"))
}

/// Reads an optional JSON config; null means defaults.
///
/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn read_config(ptr: *const c_char) -> Result<SummaryConfig, String> {
    if ptr.is_null() {
        return Ok(SummaryConfig::default());
    }
    let text = unsafe { read_str(ptr, "config_json") }?;
    serde_json::from_str::<SummaryConfig>(text)
        .map_err(|e| InsightError::from(e).to_string())
}

fn into_c_string(json: String) -> Result<*mut c_char, String> {
    CString::new(json)
        .map(CString::into_raw)
        .map_err(|e| format!("result contains NUL byte: {e}"))
}

/// Shared body of the analysis entry points.
///
/// # Safety
/// `input` and `config_json` must each be null or a valid NUL-terminated string.
unsafe fn run_analysis(
    name: &str,
    input: *const c_char,
    input_what: &str,
    config_json: *const c_char,
    analyze: fn(&str, &SummaryConfig) -> Result<String, InsightError>,
) -> *mut c_char {
    let result = panic::catch_unwind(|| {
        let text = unsafe { read_str(input, input_what) }?;
        let config = unsafe { read_config(config_json) }?;
        let json = analyze(text, &config).map_err(|e| e.to_string())?;
        into_c_string(json)
    });

    match result {
        Ok(Ok(ptr)) => {
            equip_clear_error();
            ptr
        }
        Ok(Err(msg)) => {
            warn!(entry = name, error = %msg, "FFI analysis failed");
            set_last_error(&msg);
            ptr::null_mut()
        }
        Err(_) => {
            set_last_error(&format!("panic in {name}"));
            ptr::null_mut()
        }
    }
}

// ── Analysis entry points ────────────────────────────────────────────

/// Analyzes a JSON array of equipment rows and returns the summary as JSON.
///
/// `config_json` may be null to use defaults; otherwise it is a JSON object
/// whose fields override the defaults (`bins`, `seed`, `round_decimals`, …).
///
/// Returns null on failure; see `equip_last_error()`.
///
/// # Safety
/// - `payload` must be a valid null-terminated UTF-8 string.
/// - `config_json` must be null or a valid null-terminated UTF-8 string.
/// - The returned string must be freed with `equip_string_free`.
#[no_mangle]
pub unsafe extern "C" fn equip_analyze_json(
    payload: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    unsafe { run_analysis("equip_analyze_json", payload, "payload", config_json, analyze_json) }
}

/// Analyzes CSV text with a header row and returns the summary as JSON.
///
/// Returns null on failure; see `equip_last_error()`.
///
/// # Safety
/// - `csv_data` must be a valid null-terminated UTF-8 string.
/// - `config_json` must be null or a valid null-terminated UTF-8 string.
/// - The returned string must be freed with `equip_string_free`.
#[no_mangle]
pub unsafe extern "C" fn equip_analyze_csv(
    csv_data: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    unsafe { run_analysis("equip_analyze_csv", csv_data, "csv_data", config_json, analyze_csv) }
}

/// Frees a string returned by an analysis entry point.
///
/// # Safety
/// `s` must be a pointer returned by `equip_analyze_json` /
/// `equip_analyze_csv`, or null. It must not be freed twice.
#[no_mangle]
pub unsafe extern "C" fn equip_string_free(s: *mut c_char) {
    if !s.is_null() {
        let _ = unsafe { CString::from_raw(s) };
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
