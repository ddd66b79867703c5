//! Build script for mdis-sys FFI bindings.
//!
//! Two modes:
//!
//! 1. With `mdis-sdk` feature: generates bindings from the MDIS headers and links
//!    against `libmdis_api` and `libusr_oss`
//! 2. Without feature: writes placeholder bindings so the workspace builds and
//!    tests on hosts without the MEN system package

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=wrapper.h");
    println!("cargo:rerun-if-env-changed=MDIS_INCLUDE_DIR");

    #[cfg(feature = "mdis-sdk")]
    generate_bindings();

    #[cfg(not(feature = "mdis-sdk"))]
    generate_dummy_bindings();

    #[cfg(feature = "mdis-sdk")]
    {
        if pkg_config::probe_library("mdis_api").is_ok() {
            println!("cargo:rustc-link-lib=usr_oss");
            return;
        }

        println!("cargo:rustc-link-lib=mdis_api");
        println!("cargo:rustc-link-lib=usr_oss");

        let lib_paths = ["/usr/local/lib", "/usr/lib", "/opt/menlinux/LIB"];

        for path in lib_paths {
            if std::path::Path::new(path).join("libmdis_api.so").exists()
                || std::path::Path::new(path).join("libmdis_api.a").exists()
            {
                println!("cargo:rustc-link-search=native={}", path);
                break;
            }
        }
    }
}

#[cfg(feature = "mdis-sdk")]
fn generate_bindings() {
    let include_dir = env::var("MDIS_INCLUDE_DIR").unwrap_or_else(|_| {
        for path in ["/opt/menlinux/INCLUDE/COM", "/usr/local/include", "/usr/include"] {
            if std::path::Path::new(path).join("MEN/mdis_api.h").exists() {
                return path.to_string();
            }
        }
        "/opt/menlinux/INCLUDE/COM".to_string()
    });

    println!("cargo:rerun-if-changed={}/MEN/mdis_api.h", include_dir);
    println!("cargo:rerun-if-changed={}/MEN/m36_drv.h", include_dir);

    let bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .clang_arg(format!("-I{}", include_dir))
        .allowlist_function("M_open")
        .allowlist_function("M_close")
        .allowlist_function("M_setstat")
        .allowlist_function("M_getstat")
        .allowlist_function("M_read")
        .allowlist_function("M_errstring")
        .allowlist_function("UOS_ErrnoGet")
        .allowlist_type("MDIS_PATH")
        .allowlist_type("int32")
        .allowlist_type("u_int32")
        .allowlist_type("INT32_OR_64")
        .allowlist_var("M_MK_.*")
        .allowlist_var("M_LL_.*")
        .allowlist_var("M_DEV_.*")
        .allowlist_var("M_IO_.*")
        .allowlist_var("M36_.*")
        .allowlist_var("ERR_.*")
        .derive_debug(true)
        .derive_default(true)
        .generate_comments(true)
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .generate()
        .expect("Unable to generate MDIS bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("Couldn't write bindings!");
}

/// Generate placeholder bindings when the MDIS SDK is not available.
#[cfg(not(feature = "mdis-sdk"))]
fn generate_dummy_bindings() {
    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    let dummy = r#"
// Placeholder bindings - mdis-sdk feature not enabled
//
// Constants mirror mdis_api.h / mdis_err.h / m36_drv.h. The API functions are
// stubs that fail every call with ERR_NO_SDK so that callers take their normal
// error path instead of crashing.

use std::os::raw::{c_char, c_int, c_long, c_uint};

pub type int32 = c_int;
pub type u_int32 = c_uint;
pub type INT32_OR_64 = c_long;

/// Path handle returned by M_open (negative on failure)
pub type MDIS_PATH = INT32_OR_64;

// Status code offsets
pub const M_MK_OF: u32 = 0x0000;
pub const M_LL_OF: u32 = 0x0100;
pub const M_DEV_OF: u32 = 0x0200;
pub const M_DEV_BLK_OF: u32 = 0x8000_0200;

// MDIS kernel codes
pub const M_MK_CH_CURRENT: u32 = M_MK_OF + 0x05;
pub const M_MK_IO_MODE: u32 = M_MK_OF + 0x06;

// Low-level driver codes
pub const M_LL_CH_NUMBER: u32 = M_LL_OF + 0x00;

// I/O modes
pub const M_IO_EXEC: u32 = 0;
pub const M_IO_EXEC_INC: u32 = 1;

// M36 device codes
pub const M36_CH_ENABLE: u32 = M_DEV_OF + 0x00;
pub const M36_CH_GAIN: u32 = M_DEV_OF + 0x01;
pub const M36_BIPOLAR: u32 = M_DEV_OF + 0x02;
pub const M36_EXT_TRIG: u32 = M_DEV_OF + 0x03;
pub const M36_EXT_PIN: u32 = M_DEV_OF + 0x04;
pub const M36_CALIBRATE: u32 = M_DEV_OF + 0x05;
pub const M36_SINGLE_ENDED: u32 = M_DEV_OF + 0x06;
pub const M36_NBR_ENABLED_CH: u32 = M_DEV_OF + 0x07;
pub const M36_GET_RAWDAT: u32 = M_DEV_OF + 0x0a;
pub const M36_BLK_FLASH: u32 = M_DEV_BLK_OF + 0x00;

// Error codes
pub const ERR_LL: u32 = 0x0a00;
pub const ERR_LL_UNK_CODE: u32 = ERR_LL + 0x02;
pub const ERR_LL_ILL_PARAM: u32 = ERR_LL + 0x03;
pub const ERR_LL_ILL_CHAN: u32 = ERR_LL + 0x04;
pub const ERR_LL_READ: u32 = ERR_LL + 0x0b;
pub const ERR_NO_SDK: u32 = 0x0fff;

const NO_SDK_MSG: &[u8] = b"MDIS SDK not available (build mdis-sys with the mdis-sdk feature)\0";

pub unsafe extern "C" fn M_open(_device: *const c_char) -> MDIS_PATH {
    -1
}

pub unsafe extern "C" fn M_close(_path: MDIS_PATH) -> int32 {
    -1
}

pub unsafe extern "C" fn M_setstat(_path: MDIS_PATH, _code: int32, _data: INT32_OR_64) -> int32 {
    -1
}

pub unsafe extern "C" fn M_getstat(_path: MDIS_PATH, _code: int32, _data: *mut int32) -> int32 {
    -1
}

pub unsafe extern "C" fn M_read(_path: MDIS_PATH, _value: *mut int32) -> int32 {
    -1
}

pub unsafe extern "C" fn M_errstring(_err_code: int32) -> *mut c_char {
    NO_SDK_MSG.as_ptr() as *mut c_char
}

pub unsafe extern "C" fn UOS_ErrnoGet() -> u_int32 {
    ERR_NO_SDK
}
"#;

    std::fs::write(out_path.join("bindings.rs"), dummy).expect("Couldn't write dummy bindings!");
}
