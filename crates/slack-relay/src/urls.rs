/// Extract every `<http…>` style link from Slack message text, in order of
/// appearance, or `None` when the text contains no links (never an empty
/// list).
///
/// Handles both the bare form `<https://example.com>` and the hyperlink
/// form `<https://example.com|label>`, keeping only the URI. A hand-rolled
/// scanner keeps this linear in the input length; quantified-regex
/// backtracking blows up on message text that repeats URI characters.
pub fn extract_url_list(text: &str) -> Option<Vec<String>> {
    let bytes = text.as_bytes();
    let mut urls = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let start = i + 1;
        let rest = &text[start..];
        if !rest.starts_with("http://") && !rest.starts_with("https://") {
            i += 1;
            continue;
        }

        let mut end = start;
        while end < bytes.len() && is_uri_byte(bytes[end]) {
            end += 1;
        }

        match bytes.get(end) {
            Some(b'>') => {
                urls.push(text[start..end].to_string());
                i = end + 1;
            }
            Some(b'|') => {
                // Hyperlink annotation: skip the label, keep the URI.
                let mut label_end = end + 1;
                while label_end < bytes.len()
                    && bytes[label_end] != b'>'
                    && bytes[label_end] != b'<'
                {
                    label_end += 1;
                }
                if bytes.get(label_end) == Some(&b'>') {
                    urls.push(text[start..end].to_string());
                    i = label_end + 1;
                } else {
                    i = end + 1;
                }
            }
            // Unterminated or interrupted candidate. The consumed span
            // cannot contain '<', so resuming here stays linear.
            _ => i = end,
        }
    }

    if urls.is_empty() { None } else { Some(urls) }
}

/// Unreserved and reserved URI characters plus `%` for percent-encoding.
fn is_uri_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.'
                | b'_'
                | b'~'
                | b':'
                | b'/'
                | b'?'
                | b'#'
                | b'['
                | b']'
                | b'@'
                | b'!'
                | b'$'
                | b'&'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b';'
                | b'='
                | b'%'
        )
}
