//! FFI bindings for Sleepwise
//!
//! This module provides C-compatible functions for calling Sleepwise from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `sleepwise_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::encoder::FeatureEncoder;
use crate::error::SleepwiseError;
use crate::features::FeatureDeriver;
use crate::interpret::interpret;
use crate::schema::SubmissionAdapter;

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

/// Hand a result back across the boundary, recording the error on failure
fn into_cstr(result: Result<String, SleepwiseError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a submission form JSON body into the feature vector JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepwise_free_string`.
/// - Returns NULL on error; call `sleepwise_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepwise_encode(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    into_cstr(
        SubmissionAdapter::parse_form(&json_str)
            .and_then(|form| FeatureEncoder::new().encode_to_json(&form.to_raw())),
    )
}

/// Encode a submission form JSON body into a model row (vector plus engineered features).
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepwise_free_string`.
/// - Returns NULL on error; call `sleepwise_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepwise_model_row(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    into_cstr(SubmissionAdapter::parse_form(&json_str).and_then(|form| {
        let vector = FeatureEncoder::new().encode(&form.to_raw())?;
        Ok(serde_json::to_string(&FeatureDeriver::model_row(vector))?)
    }))
}

// ============================================================================
// Interpretation
// ============================================================================

/// Interpret a score against the submission that produced it.
///
/// A NaN `score` stands for a missing score. A NULL `json` means no submission,
/// which yields an empty interpretation.
///
/// # Safety
/// - `json` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepwise_free_string`.
/// - Returns NULL on error; call `sleepwise_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepwise_interpret(score: f64, json: *const c_char) -> *mut c_char {
    clear_last_error();

    let raw = if json.is_null() {
        None
    } else {
        let Some(json_str) = cstr_to_string(json) else {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        };
        match SubmissionAdapter::parse_form(&json_str) {
            Ok(form) => Some(form.to_raw()),
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let score = (!score.is_nan()).then_some(score);
    let interpretation = interpret(score, raw.as_ref());
    into_cstr(serde_json::to_string(&interpretation).map_err(SleepwiseError::from))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Sleepwise functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Sleepwise function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepwise_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Sleepwise function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn sleepwise_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Sleepwise library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn sleepwise_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::UNINTERPRETABLE_MESSAGE;

    fn sample_form() -> CString {
        CString::new(
            r#"{
                "age": 22,
                "gender": "Female",
                "bedtime": "23:45",
                "wakeupTime": "06:30",
                "dailySteps": 9000,
                "caloriesBurned": 2600,
                "activityLevel": "High",
                "dietaryHabits": "Healthy",
                "sleepDisorders": "no",
                "medicationUsage": "no"
            }"#,
        )
        .unwrap()
    }

    unsafe fn take(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
        sleepwise_free_string(ptr);
        value
    }

    #[test]
    fn test_ffi_encode() {
        let form = sample_form();
        unsafe {
            let vector = take(sleepwise_encode(form.as_ptr()));
            assert_eq!(vector["Bedtime"], 1425);
            assert_eq!(vector["Wake-up Time"], 390);
            assert_eq!(vector["Dietary Habits"], 1);
        }
    }

    #[test]
    fn test_ffi_model_row_has_engineered_columns() {
        let form = sample_form();
        unsafe {
            let row = take(sleepwise_model_row(form.as_ptr()));
            assert_eq!(row.as_object().unwrap().len(), 14);
            assert!(row.get("EnergyBalance").is_some());
        }
    }

    #[test]
    fn test_ffi_interpret() {
        let form = sample_form();
        unsafe {
            let report = take(sleepwise_interpret(6.5, form.as_ptr()));
            assert!(report["message"].is_string());
            assert!(!report["recommendations"].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn test_ffi_interpret_missing_score_and_submission() {
        let form = sample_form();
        unsafe {
            let report = take(sleepwise_interpret(f64::NAN, form.as_ptr()));
            assert_eq!(report["message"], UNINTERPRETABLE_MESSAGE);
            assert_eq!(report["recommendations"].as_array().unwrap().len(), 0);

            let empty = take(sleepwise_interpret(7.0, ptr::null()));
            assert!(empty["message"].is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let bad = CString::new(
                r#"{"age": 30, "gender": "Male", "dailySteps": 1, "caloriesBurned": 1,
                    "activityLevel": "Extreme", "dietaryHabits": "Healthy"}"#,
            )
            .unwrap();
            let result = sleepwise_encode(bad.as_ptr());
            assert!(result.is_null());

            let error = sleepwise_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("Extreme"));

            assert!(sleepwise_encode(ptr::null()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = sleepwise_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
