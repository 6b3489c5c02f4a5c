//! Stable exit codes for `pgg` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Configuration was rejected (bad values, unknown governance mode, parse failure).
pub const INVALID: i32 = 1;
/// Reading or writing a file failed.
pub const IO: i32 = 2;
