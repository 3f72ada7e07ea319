//! FFI bindings for Taiji Form
//!
//! C-compatible functions for driving the engine from a UI process. Snapshots,
//! evaluations and session state cross the boundary as JSON strings. Returned
//! strings are allocated here and must be freed with `taiji_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::catalog::ActionCatalog;
use crate::error::EngineError;
use crate::pose::evaluate_pose;
use crate::session::SessionTracker;
use crate::types::PoseSnapshot;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Convert a JSON-producing result into a C string, recording errors
fn result_to_cstr(result: Result<String, EngineError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Evaluate a snapshot (JSON array of 33 landmarks) against a built-in action.
///
/// # Safety
/// - `snapshot_json` and `action_name` must be valid null-terminated C strings.
/// - Returns a newly allocated PoseEvaluation JSON string that must be freed with
///   `taiji_free_string`.
/// - Returns NULL on error; call `taiji_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn taiji_evaluate_pose(
    snapshot_json: *const c_char,
    action_name: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let snapshot_str = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot string pointer");
            return ptr::null_mut();
        }
    };

    let name = match cstr_to_string(action_name) {
        Some(s) => s,
        None => {
            set_last_error("Invalid action name pointer");
            return ptr::null_mut();
        }
    };

    result_to_cstr(evaluate_to_json(&snapshot_str, &name))
}

fn evaluate_to_json(snapshot_json: &str, action_name: &str) -> Result<String, EngineError> {
    let snapshot: PoseSnapshot = serde_json::from_str(snapshot_json)?;
    let action = ActionCatalog::builtin()
        .get(action_name)
        .ok_or_else(|| EngineError::UnknownAction(action_name.to_string()))?;
    Ok(serde_json::to_string(&evaluate_pose(&snapshot, action))?)
}

/// List the built-in actions as a JSON array.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `taiji_free_string`.
#[no_mangle]
pub unsafe extern "C" fn taiji_list_actions() -> *mut c_char {
    clear_last_error();
    result_to_cstr(ActionCatalog::builtin().to_json())
}

// ============================================================================
// Session API
// ============================================================================

/// Opaque handle to a practice session over the built-in catalog
pub struct TaijiSessionHandle {
    session: SessionTracker<'static>,
}

/// Create a new idle session.
///
/// # Safety
/// - Returns a pointer to a newly allocated session.
/// - Must be freed with `taiji_session_free`.
#[no_mangle]
pub unsafe extern "C" fn taiji_session_new() -> *mut TaijiSessionHandle {
    clear_last_error();
    let handle = Box::new(TaijiSessionHandle {
        session: SessionTracker::with_builtin_catalog(),
    });
    Box::into_raw(handle)
}

/// Free a session.
///
/// # Safety
/// - `session` must be a valid pointer returned by `taiji_session_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn taiji_session_free(session: *mut TaijiSessionHandle) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Start the session on the first action.
///
/// # Safety
/// - `session` must be a valid pointer returned by `taiji_session_new`.
/// - Returns 0 on success, -1 on a null handle.
#[no_mangle]
pub unsafe extern "C" fn taiji_session_start(session: *mut TaijiSessionHandle) -> i32 {
    clear_last_error();
    match session.as_mut() {
        Some(handle) => {
            handle.session.start();
            0
        }
        None => {
            set_last_error("Null session pointer");
            -1
        }
    }
}

/// Stop the session and return it to idle.
///
/// # Safety
/// - `session` must be a valid pointer returned by `taiji_session_new`.
/// - Returns 0 on success, -1 on a null handle.
#[no_mangle]
pub unsafe extern "C" fn taiji_session_stop(session: *mut TaijiSessionHandle) -> i32 {
    clear_last_error();
    match session.as_mut() {
        Some(handle) => {
            handle.session.stop();
            0
        }
        None => {
            set_last_error("Null session pointer");
            -1
        }
    }
}

/// Select the current action by name.
///
/// # Safety
/// - `session` must be a valid pointer returned by `taiji_session_new`.
/// - `action_name` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error (unknown action leaves the session unchanged).
#[no_mangle]
pub unsafe extern "C" fn taiji_session_select_action(
    session: *mut TaijiSessionHandle,
    action_name: *const c_char,
) -> i32 {
    clear_last_error();

    let handle = match session.as_mut() {
        Some(handle) => handle,
        None => {
            set_last_error("Null session pointer");
            return -1;
        }
    };

    let name = match cstr_to_string(action_name) {
        Some(s) => s,
        None => {
            set_last_error("Invalid action name pointer");
            return -1;
        }
    };

    match handle.session.select_action(&name) {
        Ok(_) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Set progress through the current action (0-1).
///
/// # Safety
/// - `session` must be a valid pointer returned by `taiji_session_new`.
/// - Returns 0 on success, -1 on a null handle.
#[no_mangle]
pub unsafe extern "C" fn taiji_session_set_progress(
    session: *mut TaijiSessionHandle,
    progress: f64,
) -> i32 {
    clear_last_error();
    match session.as_mut() {
        Some(handle) => {
            handle.session.set_progress(progress);
            0
        }
        None => {
            set_last_error("Null session pointer");
            -1
        }
    }
}

/// Ingest a snapshot (JSON array of 33 landmarks).
///
/// # Safety
/// - `session` must be a valid pointer returned by `taiji_session_new`.
/// - `snapshot_json` must be a valid null-terminated C string.
/// - Returns a newly allocated PoseEvaluation JSON string, or the JSON literal
///   `null` when the session is not evaluating. Free with `taiji_free_string`.
/// - Returns NULL on error; call `taiji_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn taiji_session_ingest(
    session: *mut TaijiSessionHandle,
    snapshot_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let handle = match session.as_mut() {
        Some(handle) => handle,
        None => {
            set_last_error("Null session pointer");
            return ptr::null_mut();
        }
    };

    let snapshot_str = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot string pointer");
            return ptr::null_mut();
        }
    };

    result_to_cstr(ingest_to_json(&mut handle.session, &snapshot_str))
}

fn ingest_to_json(
    session: &mut SessionTracker<'_>,
    snapshot_json: &str,
) -> Result<String, EngineError> {
    let snapshot: PoseSnapshot = serde_json::from_str(snapshot_json)?;
    let evaluation = session.ingest_snapshot(snapshot);
    Ok(serde_json::to_string(&evaluation)?)
}

/// Reset the combo counter.
///
/// # Safety
/// - `session` must be a valid pointer returned by `taiji_session_new`.
/// - Returns 0 on success, -1 on a null handle.
#[no_mangle]
pub unsafe extern "C" fn taiji_session_reset_combo(session: *mut TaijiSessionHandle) -> i32 {
    clear_last_error();
    match session.as_mut() {
        Some(handle) => {
            handle.session.reset_combo();
            0
        }
        None => {
            set_last_error("Null session pointer");
            -1
        }
    }
}

/// Current session state as JSON.
///
/// # Safety
/// - `session` must be a valid pointer returned by `taiji_session_new`.
/// - Returns a newly allocated string that must be freed with `taiji_free_string`.
/// - Returns NULL on error; call `taiji_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn taiji_session_state(session: *const TaijiSessionHandle) -> *mut c_char {
    clear_last_error();
    match session.as_ref() {
        Some(handle) => result_to_cstr(
            serde_json::to_string(handle.session.state()).map_err(EngineError::JsonError),
        ),
        None => {
            set_last_error("Null session pointer");
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Taiji Form functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Taiji Form function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn taiji_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Taiji Form call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn taiji_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn taiji_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
