/// Panics in debug builds, logs via `tracing::error!` in release builds.
///
/// Used on the reader thread for invariants that would be a bug to hit but
/// that we'd rather survive in production than tear the whole process down
/// over.
#[macro_export]
macro_rules! safe_assert {
    ($cond:expr $(,)?) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!($cond);
        }
        #[cfg(not(debug_assertions))]
        {
            if !$cond {
                tracing::error!("ASSERT FAILED: {}", stringify!($cond));
            }
        }
    };

    ($cond:expr, $($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!($cond, $($arg)+);
        }
        #[cfg(not(debug_assertions))]
        {
            if !$cond {
                let msg = format!($($arg)+);
                tracing::error!("ASSERT FAILED: {}", msg);
            }
        }
    };
}

/// In debug builds, panics on failure just like `debug_assert_eq!`.
/// In release builds, logs an error via `tracing::error!`.
#[macro_export]
macro_rules! safe_assert_eq {
    ($left:expr, $right:expr $(,)?) => {
        #[cfg(debug_assertions)]
        {
            debug_assert_eq!($left, $right);
        }
        #[cfg(not(debug_assertions))]
        {
            if !($left == $right) {
                tracing::error!(
                    "ASSERT FAILED: {} (left: `{:?}`, right: `{:?}`)",
                    stringify!($left == $right),
                    &$left,
                    &$right
                );
            }
        }
    };
}
