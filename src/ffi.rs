//! FFI bindings for the gaze engine
//!
//! C-compatible functions for embedding the engine in a native host app
//! (the camera/UI layer typically lives in another language). All payloads
//! are JSON in null-terminated C strings; returned strings are allocated
//! here and must be freed with `gaze_free_string`. Status-code functions
//! return 0 on success and -1 on failure; call `gaze_last_error` for the
//! failure message.
//!
//! A processor handle is single-writer state: the host must not call
//! mutating functions on the same handle from two threads at once.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::GazeError;
use crate::frame::FrameFeatures;
use crate::pipeline::GazeProcessor;
use crate::types::{GazeSample, Point};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

/// Parse a gaze sample from frame-feature JSON, enforcing the all-or-nothing
/// sample contract
fn parse_sample(json: &str) -> Result<GazeSample, GazeError> {
    FrameFeatures::from_json(json)?.into_sample()
}

/// Serialize an optional point as JSON (`null` when absent)
fn point_to_json(point: Option<Point>) -> String {
    match point {
        Some(p) => serde_json::to_string(&p).unwrap_or_else(|_| "null".to_string()),
        None => "null".to_string(),
    }
}

/// Opaque handle to a GazeProcessor
pub struct GazeProcessorHandle {
    processor: GazeProcessor,
}

/// Create a new processor with the default target plan and neighbor count.
///
/// # Safety
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `gaze_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_new() -> *mut GazeProcessorHandle {
    clear_last_error();
    let handle = Box::new(GazeProcessorHandle {
        processor: GazeProcessor::new(),
    });
    Box::into_raw(handle)
}

/// Create a processor with a custom target plan and neighbor count.
///
/// `targets_json` is a JSON array of `{"x": .., "y": ..}` points in
/// presentation order; pass NULL for the default plan. `neighbors` must be
/// at least 1.
///
/// # Safety
/// - `targets_json` must be NULL or a valid null-terminated C string.
/// - Returns NULL on error; call `gaze_last_error` for the message.
/// - Must be freed with `gaze_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_new_with_config(
    targets_json: *const c_char,
    neighbors: i32,
) -> *mut GazeProcessorHandle {
    clear_last_error();

    if neighbors < 1 {
        set_last_error(&format!("Invalid neighbor count: {}", neighbors));
        return ptr::null_mut();
    }

    let targets = if targets_json.is_null() {
        crate::session::default_target_plan()
    } else {
        let json = match cstr_to_string(targets_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid targets string pointer");
                return ptr::null_mut();
            }
        };
        match serde_json::from_str::<Vec<Point>>(&json) {
            Ok(targets) => targets,
            Err(e) => {
                set_last_error(&format!("Invalid targets JSON: {}", e));
                return ptr::null_mut();
            }
        }
    };

    match GazeProcessor::with_config(targets, neighbors as usize) {
        Ok(processor) => Box::into_raw(Box::new(GazeProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by a `gaze_processor_new*`
///   function. After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_free(processor: *mut GazeProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Deliver one frame's features and get the live estimate.
///
/// `sample_json` holds the frame features (`left_pupil`, `right_pupil`,
/// `roll`, `pitch`, `yaw`); a frame with any feature missing is rejected.
/// Returns a point JSON object, or the string `null` when there is no
/// estimate (uncalibrated, mid-calibration, or insufficient data) - the
/// host should draw nothing in that case, it is not an error.
///
/// # Safety
/// - `processor` must be a valid processor pointer.
/// - `sample_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string to free with `gaze_free_string`;
///   NULL on error.
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_submit_sample(
    processor: *mut GazeProcessorHandle,
    sample_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let json = match cstr_to_string(sample_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid sample string pointer");
            return ptr::null_mut();
        }
    };

    match parse_sample(&json) {
        Ok(sample) => {
            let estimate = handle.processor.submit_sample(sample);
            string_to_cstr(&point_to_json(estimate))
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Begin a calibration run, discarding any published calibration set.
///
/// # Safety
/// - `processor` must be a valid processor pointer.
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_start_calibration(
    processor: *mut GazeProcessorHandle,
) -> i32 {
    clear_last_error();
    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    (*processor).processor.start_calibration();
    0
}

/// The calibration target currently being presented.
///
/// Returns a point JSON object, or the string `null` when no target is
/// being presented.
///
/// # Safety
/// - `processor` must be a valid processor pointer.
/// - Returns a newly allocated string to free with `gaze_free_string`;
///   NULL on error.
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_current_target(
    processor: *mut GazeProcessorHandle,
) -> *mut c_char {
    clear_last_error();
    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    string_to_cstr(&point_to_json((*processor).processor.current_target()))
}

/// Pair the given sample with the current target and advance.
///
/// Returns the record outcome as JSON: `{"status": "advanced", ...}` with
/// the next target, or `{"status": "completed", ...}` with the published
/// calibration set.
///
/// # Safety
/// - `processor` must be a valid processor pointer.
/// - `sample_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string to free with `gaze_free_string`;
///   NULL on error (including `record` with no active target).
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_record(
    processor: *mut GazeProcessorHandle,
    sample_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let json = match cstr_to_string(sample_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid sample string pointer");
            return ptr::null_mut();
        }
    };

    let sample = match parse_sample(&json) {
        Ok(sample) => sample,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match handle.processor.record(sample) {
        Ok(outcome) => match serde_json::to_string(&outcome) {
            Ok(json) => string_to_cstr(&json),
            Err(e) => {
                set_last_error(&format!("Encoding error: {}", e));
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Record using the most recent submitted sample.
///
/// # Safety
/// - `processor` must be a valid processor pointer.
/// - Returns a newly allocated string to free with `gaze_free_string`;
///   NULL on error.
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_record_latest(
    processor: *mut GazeProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    match handle.processor.record_latest() {
        Ok(outcome) => match serde_json::to_string(&outcome) {
            Ok(json) => string_to_cstr(&json),
            Err(e) => {
                set_last_error(&format!("Encoding error: {}", e));
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Abandon the current calibration run and disable estimation.
///
/// # Safety
/// - `processor` must be a valid processor pointer.
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_cancel_calibration(
    processor: *mut GazeProcessorHandle,
) -> i32 {
    clear_last_error();
    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    match (*processor).processor.cancel_calibration() {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Whether a calibration set is currently published (1) or not (0).
///
/// # Safety
/// - `processor` must be a valid processor pointer.
#[no_mangle]
pub unsafe extern "C" fn gaze_processor_is_calibrated(
    processor: *mut GazeProcessorHandle,
) -> i32 {
    clear_last_error();
    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    (*processor).processor.is_calibrated() as i32
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local string, valid until the next FFI
///   call on this thread. Do NOT free this pointer.
/// - Returns NULL if there is no error.
#[no_mangle]
pub unsafe extern "C" fn gaze_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(err) => err.as_ptr(),
        None => ptr::null(),
    })
}

/// Free a string returned by this API.
///
/// # Safety
/// - `s` must be a pointer returned by a function in this module, or NULL.
#[no_mangle]
pub unsafe extern "C" fn gaze_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(mid_x: f64, mid_y: f64) -> CString {
        let json = format!(
            r#"{{"left_pupil":{{"x":{},"y":{}}},"right_pupil":{{"x":{},"y":{}}},"roll":0.0,"pitch":0.0,"yaw":0.0}}"#,
            mid_x - 30.0,
            mid_y,
            mid_x + 30.0,
            mid_y
        );
        CString::new(json).unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        gaze_free_string(ptr);
        s
    }

    #[test]
    fn test_full_calibration_over_ffi() {
        unsafe {
            let handle = gaze_processor_new();
            assert!(!handle.is_null());

            assert_eq!(gaze_processor_is_calibrated(handle), 0);
            assert_eq!(gaze_processor_start_calibration(handle), 0);

            let target = take_string(gaze_processor_current_target(handle));
            assert!(target.contains("100"), "target = {}", target);

            let mids = [
                (300.0, 250.0),
                (350.0, 250.0),
                (350.0, 300.0),
                (300.0, 300.0),
                (325.0, 275.0),
            ];
            for (i, (x, y)) in mids.iter().enumerate() {
                let json = sample_json(*x, *y);
                let outcome = take_string(gaze_processor_record(handle, json.as_ptr()));
                if i < mids.len() - 1 {
                    assert!(outcome.contains("advanced"), "outcome = {}", outcome);
                } else {
                    assert!(outcome.contains("completed"), "outcome = {}", outcome);
                }
            }

            assert_eq!(gaze_processor_is_calibrated(handle), 1);

            let json = sample_json(325.0, 275.0);
            let estimate = take_string(gaze_processor_submit_sample(handle, json.as_ptr()));
            assert_ne!(estimate, "null");

            gaze_processor_free(handle);
        }
    }

    #[test]
    fn test_incomplete_frame_sets_error() {
        unsafe {
            let handle = gaze_processor_new();
            let json = CString::new(r#"{"left_pupil":{"x":1.0,"y":2.0}}"#).unwrap();
            let result = gaze_processor_submit_sample(handle, json.as_ptr());
            assert!(result.is_null());

            let err = gaze_last_error();
            assert!(!err.is_null());
            let msg = CStr::from_ptr(err).to_str().unwrap();
            assert!(msg.contains("right_pupil"), "msg = {}", msg);

            gaze_processor_free(handle);
        }
    }

    #[test]
    fn test_record_without_target_sets_error() {
        unsafe {
            let handle = gaze_processor_new();
            let json = sample_json(300.0, 250.0);
            let result = gaze_processor_record(handle, json.as_ptr());
            assert!(result.is_null());

            let err = gaze_last_error();
            assert!(!err.is_null());

            gaze_processor_free(handle);
        }
    }

    #[test]
    fn test_invalid_neighbor_count_rejected() {
        unsafe {
            let handle = gaze_processor_new_with_config(ptr::null(), 0);
            assert!(handle.is_null());
            assert!(!gaze_last_error().is_null());
        }
    }
}
