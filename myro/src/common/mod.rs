//! Feature gated logging.
//!
//! Every macro here expands to nothing unless its feature is enabled, arguments are not
//! evaluated in that case.

/// `TRACE` event through `tracing`, requires the `verbose` feature.
macro_rules! verbose {
    ($($tt:tt)*) => {
        #[cfg(feature = "verbose")]
        tracing::trace!($($tt)*)
    };
}

/// `TRACE` span entered until the end of the enclosing block, requires the `verbose` feature.
macro_rules! span {
    ($($tt:tt)*) => {
        #[cfg(feature = "verbose")]
        let _span = tracing::trace_span!($($tt)*).entered();
    };
}

/// `DEBUG` record through `log`, requires the `log` feature.
macro_rules! debug {
    ($($tt:tt)*) => {
        #[cfg(feature = "log")]
        log::debug!($($tt)*)
    };
}

pub(crate) use debug;
pub(crate) use span;
pub(crate) use verbose;
