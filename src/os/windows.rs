//! Windows-specific error codes.

use std::io;
use winapi::shared::winerror::{ERROR_FILENAME_EXCED_RANGE, ERROR_INVALID_NAME};

/// `ERROR_FILENAME_EXCED_RANGE`: the path is longer than MAX_PATH allows.
pub fn is_path_too_long(err: &io::Error) -> bool {
    err.raw_os_error() == Some(ERROR_FILENAME_EXCED_RANGE as i32)
}

/// `ERROR_INVALID_NAME`: reserved characters such as `<>:"|?*` in a path.
pub fn is_invalid_name(err: &io::Error) -> bool {
    err.raw_os_error() == Some(ERROR_INVALID_NAME as i32)
}
