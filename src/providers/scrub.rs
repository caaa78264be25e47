use std::borrow::Cow;

use crate::error::BackendError;

const MAX_ERROR_CHARS: usize = 200;

/// Markers whose following token gets redacted from upstream error text.
const SECRET_MARKERS: [&str; 6] = [
    "sk-",
    "api_key=",
    "access_token=",
    "Authorization: Bearer ",
    "\"api_key\":\"",
    "\"access_token\":\"",
];

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn redact_after(text: &mut String, marker: &str) {
    let mut from = 0;
    while let Some(rel) = text[from..].find(marker) {
        let start = from + rel;
        let token_start = start + marker.len();
        let token_len: usize = text[token_start..]
            .chars()
            .take_while(|c| is_token_char(*c))
            .map(char::len_utf8)
            .sum();

        if token_len == 0 {
            from = token_start;
            continue;
        }

        text.replace_range(start..token_start + token_len, "[REDACTED]");
        from = start + "[REDACTED]".len();
    }
}

/// Scrub credential-looking tokens from upstream error text and cap its
/// length, so a backend error body can be logged or embedded in a response.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = if SECRET_MARKERS.iter().any(|m| input.contains(m)) {
        let mut text = input.to_string();
        for marker in SECRET_MARKERS {
            redact_after(&mut text, marker);
        }
        Cow::Owned(text)
    } else {
        Cow::Borrowed(input)
    };

    if scrubbed.chars().count() <= MAX_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let truncated: String = scrubbed.chars().take(MAX_ERROR_CHARS).collect();
    format!("{truncated}...")
}

/// Build a [`BackendError`] from a non-2xx backend response, preserving the
/// sanitized error body.
pub async fn api_error(backend: &'static str, response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    BackendError::Api {
        backend,
        status,
        message: sanitize_api_error(&body),
    }
}
