//! Logging macros that compile to nothing without the `tracing` feature.

#[cfg(feature = "tracing")]
macro_rules! debug {
    ($($tt:tt)*) => { tracing::debug!($($tt)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! warn_log {
    ($($tt:tt)*) => { tracing::warn!($($tt)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_log {
    ($($tt:tt)*) => {};
}

pub(crate) use debug;
pub(crate) use warn_log;
