//! FFI bindings for Habitflux
//!
//! This module provides C-compatible functions for calling Habitflux from other
//! languages (the tracker's web/mobile shells). Habits are passed in as a JSON
//! storage export and results come back as JSON. All returned strings are
//! allocated by Rust and must be freed with `habitflux_free_string`.
//!
//! Reference times are Unix milliseconds; a value `<= 0` means "use the
//! current clock".

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::adapter::HabitAdapter;
use crate::config::AnalyticsConfig;
use crate::engine::HabitAnalytics;
use crate::error::AnalyticsError;
use crate::types::{Habit, Timeframe};

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

fn reference_time(now_ms: i64) -> Result<Option<DateTime<Utc>>, AnalyticsError> {
    if now_ms <= 0 {
        return Ok(None);
    }
    Utc.timestamp_millis_opt(now_ms)
        .single()
        .map(Some)
        .ok_or_else(|| AnalyticsError::DateParseError(format!("Invalid timestamp: {now_ms}")))
}

fn lookback(days: i32) -> Result<u32, AnalyticsError> {
    u32::try_from(days)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| AnalyticsError::ParseError(format!("Invalid lookback days: {days}")))
}

/// Decode the arguments shared by every call, run `op` and encode its result.
///
/// Returns NULL and records the error on failure.
unsafe fn run_json<T, F>(
    analytics: &HabitAnalytics,
    json: *const c_char,
    now_ms: i64,
    op: F,
) -> *mut c_char
where
    T: Serialize,
    F: FnOnce(&HabitAnalytics, &[Habit]) -> Result<T, AnalyticsError>,
{
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = reference_time(now_ms)
        .and_then(|now| {
            let analytics = match now {
                Some(now) => analytics.clone().at(now),
                None => analytics.clone(),
            };
            let habits = HabitAdapter::parse_storage(&json_str)?;
            op(&analytics, &habits)
        })
        .and_then(|value| serde_json::to_string(&value).map_err(AnalyticsError::from));

    match result {
        Ok(output) => string_to_cstr(&output),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

unsafe fn timeframe_arg(timeframe: *const c_char) -> Result<Timeframe, AnalyticsError> {
    cstr_to_string(timeframe)
        .ok_or_else(|| AnalyticsError::MissingField("timeframe".to_string()))?
        .parse()
}

// ============================================================================
// Stateless API
// ============================================================================

/// Correlate every habit pair and return a JSON array.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `habitflux_free_string`.
/// - Returns NULL on error; call `habitflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habitflux_correlations(
    json: *const c_char,
    lookback_days: i32,
    now_ms: i64,
) -> *mut c_char {
    run_json(&HabitAnalytics::new(), json, now_ms, |a, habits| {
        Ok(a.correlations(habits, lookback(lookback_days)?))
    })
}

/// Detect productivity patterns and return a JSON array.
///
/// # Safety
/// Same contract as `habitflux_correlations`.
#[no_mangle]
pub unsafe extern "C" fn habitflux_patterns(
    json: *const c_char,
    lookback_days: i32,
    now_ms: i64,
) -> *mut c_char {
    run_json(&HabitAnalytics::new(), json, now_ms, |a, habits| {
        Ok(a.patterns(habits, lookback(lookback_days)?))
    })
}

/// Generate habit insights and return a JSON array.
///
/// # Safety
/// Same contract as `habitflux_correlations`.
#[no_mangle]
pub unsafe extern "C" fn habitflux_insights(
    json: *const c_char,
    lookback_days: i32,
    now_ms: i64,
) -> *mut c_char {
    run_json(&HabitAnalytics::new(), json, now_ms, |a, habits| {
        Ok(a.insights(habits, lookback(lookback_days)?))
    })
}

/// Score habits for a timeframe (`week`, `month`, `quarter`, `year`).
///
/// # Safety
/// - `json` and `timeframe` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `habitflux_free_string`.
/// - Returns NULL on error; call `habitflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habitflux_compare(
    json: *const c_char,
    timeframe: *const c_char,
    now_ms: i64,
) -> *mut c_char {
    let timeframe = timeframe_arg(timeframe);
    run_json(&HabitAnalytics::new(), json, now_ms, |a, habits| {
        Ok(a.comparative(habits, timeframe?))
    })
}

/// Build the full analytics report for a timeframe.
///
/// # Safety
/// Same contract as `habitflux_compare`.
#[no_mangle]
pub unsafe extern "C" fn habitflux_report(
    json: *const c_char,
    timeframe: *const c_char,
    now_ms: i64,
) -> *mut c_char {
    let timeframe = timeframe_arg(timeframe);
    run_json(&HabitAnalytics::new(), json, now_ms, |a, habits| {
        Ok(a.report(habits, timeframe?))
    })
}

// ============================================================================
// Configured Analytics API
// ============================================================================

/// Opaque handle to a configured HabitAnalytics service
pub struct HabitAnalyticsHandle {
    analytics: HabitAnalytics,
}

/// Create an analytics service from a JSON config (NULL for defaults).
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Must be freed with `habitflux_analytics_free`.
/// - Returns NULL on error; call `habitflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habitflux_analytics_new(
    config_json: *const c_char,
) -> *mut HabitAnalyticsHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        AnalyticsConfig::default()
    } else {
        let parsed = match cstr_to_string(config_json) {
            Some(s) => AnalyticsConfig::from_json(&s),
            None => Err(AnalyticsError::ConfigError(
                "Invalid config string pointer".to_string(),
            )),
        };
        match parsed {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(HabitAnalyticsHandle {
        analytics: HabitAnalytics::with_config(config),
    });
    Box::into_raw(handle)
}

/// Free an analytics service.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `habitflux_analytics_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn habitflux_analytics_free(handle: *mut HabitAnalyticsHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Build the full analytics report with a configured service.
///
/// A NULL `timeframe` uses the configured default.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `habitflux_analytics_new`.
/// - `json` must be a valid null-terminated C string; `timeframe` may be NULL.
/// - Returns a newly allocated string that must be freed with `habitflux_free_string`.
/// - Returns NULL on error; call `habitflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habitflux_analytics_report(
    handle: *const HabitAnalyticsHandle,
    json: *const c_char,
    timeframe: *const c_char,
    now_ms: i64,
) -> *mut c_char {
    if handle.is_null() {
        set_last_error("Null analytics pointer");
        return ptr::null_mut();
    }

    let handle = &*handle;
    let timeframe = if timeframe.is_null() {
        Ok(handle.analytics.config().default_timeframe)
    } else {
        timeframe_arg(timeframe)
    };

    run_json(&handle.analytics, json, now_ms, |a, habits| {
        Ok(a.report(habits, timeframe?))
    })
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Habitflux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Habitflux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn habitflux_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Habitflux call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn habitflux_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Habitflux library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn habitflux_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
