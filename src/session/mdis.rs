//! MDIS hardware session.
//!
//! Wraps an MDIS path from `mdis-sys`. The path is released by
//! [`DeviceSession::close`]; [`super::Session`] makes sure that happens.

#![allow(unsafe_code)]

use std::ffi::{CStr, CString};

use tracing::info;

use super::{DeviceSession, StatusCode};
use crate::error::SessionError;

/// An open MDIS path to an M36 module.
pub struct MdisSession {
    path: mdis_sys::MDIS_PATH,
    device: String,
}

impl MdisSession {
    /// Open an MDIS device by name, e.g. `m36_1`.
    ///
    /// # Errors
    ///
    /// Returns the MDIS error for the failed `M_open`.
    pub fn open(device: &str) -> Result<Self, SessionError> {
        let c_device = CString::new(device).map_err(|_| {
            SessionError::new(
                mdis_sys::ERR_LL_ILL_PARAM as u32,
                format!("invalid device name: {}", device),
            )
        })?;

        // SAFETY: c_device is a valid null-terminated string
        let path = unsafe { mdis_sys::M_open(c_device.as_ptr()) };
        if path < 0 {
            return Err(last_error());
        }

        info!(device = %device, path = path as i64, "Opened MDIS path");

        Ok(Self {
            path,
            device: device.to_string(),
        })
    }
}

/// Build an error from the calling thread's MDIS error number.
fn last_error() -> SessionError {
    // SAFETY: both calls only read per-thread error state; M_errstring returns a
    // pointer to a static or thread-local buffer
    unsafe {
        let code = mdis_sys::UOS_ErrnoGet() as u32;
        let msg_ptr = mdis_sys::M_errstring(code as _);
        let message = if msg_ptr.is_null() {
            format!("unknown error 0x{:04x}", code)
        } else {
            CStr::from_ptr(msg_ptr).to_string_lossy().trim_end().to_string()
        };
        SessionError::new(code, message)
    }
}

impl DeviceSession for MdisSession {
    fn device(&self) -> &str {
        &self.device
    }

    fn set_config(&mut self, code: StatusCode, value: i32) -> Result<(), SessionError> {
        // SAFETY: path came from a successful M_open and is not closed yet
        let result = unsafe { mdis_sys::M_setstat(self.path, code.raw() as _, value as _) };
        if result < 0 {
            return Err(last_error());
        }
        Ok(())
    }

    fn get_config(&mut self, code: StatusCode) -> Result<i32, SessionError> {
        let mut value: mdis_sys::int32 = 0;
        // SAFETY: path is open and value outlives the call
        let result = unsafe { mdis_sys::M_getstat(self.path, code.raw() as _, &mut value) };
        if result < 0 {
            return Err(last_error());
        }
        Ok(value as i32)
    }

    fn read(&mut self) -> Result<i32, SessionError> {
        let mut value: mdis_sys::int32 = 0;
        // SAFETY: path is open and value outlives the call
        let result = unsafe { mdis_sys::M_read(self.path, &mut value) };
        if result < 0 {
            return Err(last_error());
        }
        Ok(value as i32)
    }

    fn close(&mut self) -> Result<(), SessionError> {
        // SAFETY: Session calls close at most once
        let result = unsafe { mdis_sys::M_close(self.path) };
        if result < 0 {
            return Err(last_error());
        }
        Ok(())
    }
}

impl std::fmt::Debug for MdisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MdisSession")
            .field("device", &self.device)
            .field("path", &(self.path as i64))
            .finish()
    }
}

#[cfg(all(test, not(feature = "mdis_hardware")))]
mod tests {
    use super::*;

    #[test]
    fn test_open_without_sdk_reports_error() {
        let err = MdisSession::open("m36_1").unwrap_err();
        assert_eq!(err.code, mdis_sys::ERR_NO_SDK);
        assert!(err.message.contains("mdis-sdk"));
    }

    #[test]
    fn test_device_name_with_nul_is_rejected() {
        let err = MdisSession::open("m36\0_1").unwrap_err();
        assert!(err.message.contains("invalid device name"));
    }
}
