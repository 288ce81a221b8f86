use std::fmt::Display;

/// Downgrades a tolerated failure to `None`, logging it with some context.
pub trait ResultOkLogExt<T, E> {
    fn ok_log(self, context: impl Display) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, context: impl Display) -> Option<T> {
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

    #[test]
    fn test_ok_log() {
        let ok: Result<u8, std::fmt::Error> = Ok(1);
        assert_eq!(ok.ok_log("unused"), Some(1));

        let err: Result<u8, std::fmt::Error> = Err(std::fmt::Error);
        assert_eq!(err.ok_log("formatting"), None);
    }
}
