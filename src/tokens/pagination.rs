/// Cursor-based pagination over a sorted token list
///
/// A cursor is base64url (no padding) JSON `{"index": n, "limit": n}`. It is a
/// raw offset into the list it was issued for; reusing it with different
/// filter or sort parameters pages through a different ordering.
use crate::logger::{self, LogTag};
use crate::tokens::types::{PaginationParams, TokenPage, TokenRecord};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Decoded cursor payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationCursor {
    pub index: usize,
    pub limit: usize,
}

pub fn encode_cursor(index: usize, limit: usize) -> String {
    let payload = serde_json::json!({ "index": index, "limit": limit });
    URL_SAFE_NO_PAD.encode(payload.to_string())
}

/// Payload carried by `cursor`, or None when it is not a valid cursor
///
/// Standard-alphabet and padded input is accepted. `index` must be a
/// non-negative integer; a missing or malformed `limit` decodes as 0.
pub fn decode_cursor(cursor: &str) -> Option<PaginationCursor> {
    let normalized: String = cursor
        .trim()
        .chars()
        .filter(|c| *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes()).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let index = usize::try_from(value.get("index")?.as_u64()?).ok()?;
    let limit = value
        .get("limit")
        .and_then(|limit| limit.as_u64())
        .and_then(|limit| usize::try_from(limit).ok())
        .unwrap_or(0);
    Some(PaginationCursor { index, limit })
}

/// Slice one page out of `records`
///
/// A limit of 0 uses `default_limit`; anything above `max_limit` is clamped.
/// An undecodable cursor restarts at offset 0.
pub fn paginate(
    records: Vec<TokenRecord>,
    params: &PaginationParams,
    default_limit: usize,
    max_limit: usize,
) -> TokenPage {
    let limit = effective_limit(params.limit, default_limit, max_limit);

    let offset = match params.cursor.as_deref() {
        None | Some("") => 0,
        Some(cursor) => match decode_cursor(cursor) {
            Some(decoded) => decoded.index,
            None => {
                logger::warning(
                    LogTag::Pagination,
                    &format!("Invalid pagination cursor '{}', starting from offset 0", cursor),
                );
                0
            }
        },
    };

    let total = records.len();
    let end = offset.saturating_add(limit).min(total);
    let tokens = if offset < total {
        records.into_iter().skip(offset).take(end - offset).collect()
    } else {
        Vec::new()
    };

    let next_cursor = if offset.saturating_add(limit) < total {
        Some(encode_cursor(offset + limit, limit))
    } else {
        None
    };

    logger::debug(
        LogTag::Pagination,
        &format!(
            "Page offset={} limit={} returned={} total={}",
            offset,
            limit,
            tokens.len(),
            total
        ),
    );

    TokenPage {
        tokens,
        next_cursor,
        total,
        timestamp: chrono::Utc::now().timestamp_millis(),
    }
}

fn effective_limit(requested: usize, default_limit: usize, max_limit: usize) -> usize {
    let limit = if requested == 0 { default_limit } else { requested };
    limit.min(max_limit).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::types::fixtures::with_volume;
    use base64::engine::general_purpose::STANDARD;

    fn records(n: usize) -> Vec<TokenRecord> {
        (0..n).map(|i| with_volume(&format!("t{}", i), i as f64)).collect()
    }

    #[test]
    fn test_cursor_round_trip() {
        let cursor = encode_cursor(40, 20);
        assert!(!cursor.contains('='));
        assert_eq!(
            decode_cursor(&cursor),
            Some(PaginationCursor { index: 40, limit: 20 })
        );

        let decoded = decode_cursor(&encode_cursor(7, 13)).unwrap();
        assert_eq!(decoded.index, 7);
        assert_eq!(decoded.limit, 13);
    }

    #[test]
    fn test_cursor_rejects_bad_input() {
        assert_eq!(decode_cursor("not base64 at all!"), None);
        assert_eq!(decode_cursor(&URL_SAFE_NO_PAD.encode("[1,2]")), None);
        assert_eq!(decode_cursor(&URL_SAFE_NO_PAD.encode(r#"{"index":-1,"limit":5}"#)), None);
        assert_eq!(decode_cursor(&URL_SAFE_NO_PAD.encode(r#"{"index":"3","limit":5}"#)), None);
        assert_eq!(decode_cursor(&URL_SAFE_NO_PAD.encode(r#"{"index":1.5}"#)), None);
    }

    #[test]
    fn test_cursor_without_limit_decodes_zero_limit() {
        let cursor = URL_SAFE_NO_PAD.encode(r#"{"index":4}"#);
        assert_eq!(
            decode_cursor(&cursor),
            Some(PaginationCursor { index: 4, limit: 0 })
        );
    }

    #[test]
    fn test_cursor_accepts_padded_standard_alphabet() {
        let padded = STANDARD.encode(r#"{"index":7,"limit":3}"#);
        assert_eq!(
            decode_cursor(&padded),
            Some(PaginationCursor { index: 7, limit: 3 })
        );
    }

    #[test]
    fn test_pages_are_contiguous() {
        let all = records(45);
        let mut seen = Vec::new();
        let mut cursor = None;

        loop {
            let page = paginate(
                all.clone(),
                &PaginationParams { limit: 20, cursor: cursor.clone() },
                20,
                100,
            );
            assert_eq!(page.total, 45);
            seen.extend(page.tokens.into_iter().map(|t| t.token_address));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let expected: Vec<String> = all.into_iter().map(|t| t.token_address).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        let page = paginate(records(150), &PaginationParams::default(), 20, 100);
        assert_eq!(page.tokens.len(), 20);

        let page = paginate(
            records(150),
            &PaginationParams { limit: 500, cursor: None },
            20,
            100,
        );
        assert_eq!(page.tokens.len(), 100);
        assert!(page.next_cursor.is_some());
    }

    #[test]
    fn test_invalid_cursor_starts_at_zero() {
        let page = paginate(
            records(5),
            &PaginationParams { limit: 2, cursor: Some("garbage".to_string()) },
            20,
            100,
        );
        assert_eq!(page.tokens[0].token_address, "t0");
    }

    #[test]
    fn test_last_page_has_no_cursor() {
        let page = paginate(
            records(4),
            &PaginationParams { limit: 2, cursor: Some(encode_cursor(2, 2)) },
            20,
            100,
        );
        assert_eq!(page.tokens.len(), 2);
        assert!(page.next_cursor.is_none());

        let beyond = paginate(
            records(4),
            &PaginationParams { limit: 2, cursor: Some(encode_cursor(10, 2)) },
            20,
            100,
        );
        assert!(beyond.tokens.is_empty());
        assert!(beyond.next_cursor.is_none());
    }
}
