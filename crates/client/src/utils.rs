//! Internal helper macros shared by the parser, the builder and the transports.

/// Returns early with `Err($error)` when `$predicate` does not hold.
///
/// Works like `assert!`, but for recoverable validation failures:
///
/// ```ignore
/// ensure!(code.len() == 3, ResponseError::invalid_status_code(code));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Returns the index of the first `\r\n` in `bytes`.
#[inline]
pub(crate) fn find_crlf(bytes: &[u8]) -> Option<usize> {
    bytes.windows(2).position(|window| window == b"\r\n")
}

/// Decodes header bytes as UTF-8, falling back to ISO-8859-1 so that
/// `obs-text` survives as U+0080..=U+00FF.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_not_utf8) => bytes.iter().copied().map(char::from).collect(),
    }
}
