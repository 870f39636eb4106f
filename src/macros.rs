#![allow(unused_macros)]

/// Helper macro for locking items, poisoned locks surface as [`crate::Error::LockError`]
///
/// ```rust, ignore
///  let mut chunks = lock!(self.free)?;
///  chunks.push(buffer);
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().map_err(|_| crate::Error::LockError)
    };
}

/// Helper macro for building [`crate::Error::OutOfBounds`] at the current position
///
/// ```rust, ignore
///  if offset + 4 > data.len() {
///      return Err(out_of_bounds_error!());
///  }
/// ```
macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// Helper macro for building [`crate::Error::InvalidArgument`]
///
/// ```rust, ignore
///  return Err(invalid_argument_error!("alignment {} is not a power of two", alignment));
/// ```
macro_rules! invalid_argument_error {
    ($msg:expr) => {
        crate::Error::InvalidArgument($msg.to_string())
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidArgument(format!($fmt, $($arg)*))
    };
}
