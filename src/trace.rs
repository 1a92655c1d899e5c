//! Diagnostics shim.
//!
//! Enable with `--features tracing`. Without the feature every macro expands to
//! nothing, so the hot paths carry no logging cost.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};
// Only the allocating path reports warnings.
#[cfg(all(feature = "tracing", feature = "alloc"))]
pub(crate) use tracing::warn;

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_noop {
    ($($arg:tt)*) => {};
}

#[cfg(all(not(feature = "tracing"), feature = "alloc"))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use trace_noop as trace;
#[cfg(all(not(feature = "tracing"), feature = "alloc"))]
pub(crate) use warn_noop as warn;
