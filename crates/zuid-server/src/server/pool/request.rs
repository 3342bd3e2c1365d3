//! Validation of the messages a worker receives.
//!
//! A worker sees `[token, count]`. Anything else, and any count that is not a
//! positive number within the configured limit, is rejected; the caller drops
//! the message without replying.

use bytes::Bytes;
use zuid_wire::Multipart;

/// Why a message was dropped instead of answered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("expected 2 parts, received {0}")]
    WrongPartCount(usize),

    #[error("count {0} is not positive")]
    NonPositive(i64),

    #[error("count {count} exceeds the limit of {max}")]
    TooLarge { count: i64, max: u64 },
}

/// A validated request for `count` identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRequest {
    /// The routing token frame, echoed back untouched as the first reply part.
    pub token: Bytes,
    pub count: u64,
}

impl IdRequest {
    /// Validates `[token, count]` against `max_count`.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] describing why the message gets no reply.
    pub fn parse(message: Multipart, max_count: u64) -> Result<Self, Rejection> {
        if message.len() != 2 {
            return Err(Rejection::WrongPartCount(message.len()));
        }

        let mut parts = message.into_iter();
        let (Some(token), Some(payload)) = (parts.next(), parts.next()) else {
            return Err(Rejection::WrongPartCount(0));
        };

        let count = parse_count(&payload);
        if count <= 0 {
            return Err(Rejection::NonPositive(count));
        }
        // Positive, so the cast is lossless.
        if count as u64 > max_count {
            return Err(Rejection::TooLarge {
                count,
                max: max_count,
            });
        }

        Ok(Self {
            token,
            count: count as u64,
        })
    }
}

/// Reads a count the way C's `atoi` would, saturating instead of
/// overflowing.
///
/// Leading whitespace is skipped, one optional sign is accepted, and digits
/// are consumed until the first non-digit. A payload without leading digits
/// reads as zero.
pub fn parse_count(payload: &[u8]) -> i64 {
    let mut rest = payload;
    while let [first, tail @ ..] = rest {
        if matches!(first, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r') {
            rest = tail;
        } else {
            break;
        }
    }

    let negative = match rest {
        [b'-', tail @ ..] => {
            rest = tail;
            true
        }
        [b'+', tail @ ..] => {
            rest = tail;
            false
        }
        _ => false,
    };

    let magnitude = rest
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0_i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });

    if negative { -magnitude } else { magnitude }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(parts: &[&'static str]) -> Multipart {
        parts.iter().copied().collect()
    }

    #[test]
    fn counts_follow_atoi() {
        assert_eq!(parse_count(b"3"), 3);
        assert_eq!(parse_count(b"  42"), 42);
        assert_eq!(parse_count(b"+7"), 7);
        assert_eq!(parse_count(b"-3"), -3);
        assert_eq!(parse_count(b"12abc"), 12);
        assert_eq!(parse_count(b"abc"), 0);
        assert_eq!(parse_count(b""), 0);
        assert_eq!(parse_count(b"- 5"), 0);
        assert_eq!(parse_count(b"0005"), 5);
    }

    #[test]
    fn huge_counts_saturate() {
        assert_eq!(parse_count(b"99999999999999999999999"), i64::MAX);
        assert_eq!(parse_count(b"-99999999999999999999999"), -i64::MAX);
    }

    #[test]
    fn valid_request_keeps_token() {
        let request = IdRequest::parse(message(&["tok", "3"]), u64::MAX).unwrap();
        assert_eq!(request.token, Bytes::from_static(b"tok"));
        assert_eq!(request.count, 3);
    }

    #[test]
    fn non_positive_counts_are_rejected() {
        for payload in ["0", "-3", "abc", ""] {
            let err = IdRequest::parse(message(&["tok", payload]), u64::MAX).unwrap_err();
            assert!(matches!(err, Rejection::NonPositive(_)), "{payload}: {err}");
        }
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert_eq!(
            IdRequest::parse(message(&["tok"]), 10),
            Err(Rejection::WrongPartCount(1))
        );
        assert_eq!(
            IdRequest::parse(message(&["tok", "1", "2"]), 10),
            Err(Rejection::WrongPartCount(3))
        );
    }

    #[test]
    fn limit_is_inclusive() {
        assert_eq!(IdRequest::parse(message(&["t", "10"]), 10).unwrap().count, 10);
        assert_eq!(
            IdRequest::parse(message(&["t", "11"]), 10),
            Err(Rejection::TooLarge { count: 11, max: 10 })
        );
    }
}
