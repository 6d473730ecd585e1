#[cfg(feature = "tracing")]
macro_rules! rq_trace {
    ($($tt:tt)*) => {
        tracing::trace!(target: "range_query", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! rq_trace {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! rq_debug {
    ($($tt:tt)*) => {
        tracing::debug!(target: "range_query", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! rq_debug {
    ($($tt:tt)*) => {};
}
