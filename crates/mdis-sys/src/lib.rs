//! Low-level FFI bindings for the MEN MDIS user-space API.
//!
//! This crate provides raw, unsafe bindings to `libmdis_api` (path and
//! status-code calls) and `libusr_oss` (error number lookup), together with the
//! status codes of the M36 analog input low-level driver.
//!
//! # MDIS Overview
//!
//! MDIS drives M-Module carriers through a uniform path interface: a device is
//! opened by name, configured through integer setstat/getstat codes, and read
//! one value per `M_read` call. Failing calls return a negative value and leave
//! the reason in the per-thread error number (`UOS_ErrnoGet`).
//!
//! # Safety
//!
//! All functions in this crate are `unsafe` as they are direct FFI bindings.
//! For a safe wrapper, use the `m36_daq` crate instead.
//!
//! # Features
//!
//! - `mdis-sdk`: Generate bindings from the installed MDIS headers and link the
//!   real libraries. Without this feature placeholder bindings are used whose
//!   calls all fail with `ERR_NO_SDK`.
//!
//! # Example (unsafe)
//!
//! ```no_run
//! use mdis_sys::*;
//! use std::ffi::CString;
//!
//! unsafe {
//!     let device = CString::new("m36_1").unwrap();
//!     let path = M_open(device.as_ptr());
//!     if path >= 0 {
//!         let mut channels = 0;
//!         M_getstat(path, M_LL_CH_NUMBER as _, &mut channels);
//!         println!("Device has {} channels", channels);
//!         M_close(path);
//!     }
//! }
//! ```

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]
#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
