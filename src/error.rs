use std::fmt;

/// Converts a `Result` into an `Option`, logging the error at `warn` level.
///
/// Used where a failure concerns a single metric or container and must not stop
/// the caller.
pub trait ResultOkLogExt<T, E> {
    fn ok_log(self) -> Option<T>;

    /// Like [`ok_log`](ResultOkLogExt::ok_log), with the log line prefixed by `context`.
    fn ok_log_context(self, context: impl fmt::Display) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    fn ok_log_context(self, context: impl fmt::Display) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::warn!("{context}: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_ok_log() {
        assert_eq!(Ok::<u8, Boom>(1).ok_log(), Some(1));
        assert_eq!(Err::<u8, Boom>(Boom).ok_log(), None);
        assert_eq!(Err::<u8, Boom>(Boom).ok_log_context("sending"), None);
    }
}
