//! Platform-specific classification of filesystem errors.

use std::io;

#[cfg(windows)]
pub mod windows;

/// Check if an OS error means a path or path component exceeded the platform limit.
#[cfg(unix)]
pub fn is_path_too_long(err: &io::Error) -> bool {
    err.raw_os_error() == Some(nix::errno::Errno::ENAMETOOLONG as i32)
}

/// Check if an OS error means a path or path component exceeded the platform limit.
#[cfg(windows)]
pub fn is_path_too_long(err: &io::Error) -> bool {
    windows::is_path_too_long(err)
}

/// Check if an OS error was caused by characters the filesystem does not accept.
#[cfg(unix)]
pub fn is_invalid_name(err: &io::Error) -> bool {
    // Interior NUL bytes are rejected by std before reaching the kernel
    err.kind() == io::ErrorKind::InvalidInput
}

/// Check if an OS error was caused by characters the filesystem does not accept.
#[cfg(windows)]
pub fn is_invalid_name(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::InvalidInput || windows::is_invalid_name(err)
}
