/// Maximum characters of extracted page text inlined into a message.
const MAX_CONTENT_CHARS: usize = 15_000;

/// Inline the fetched content of each extracted URL into `text`.
///
/// Every literal `<url>` occurrence is removed from the message, and one
/// labeled content block per URL is appended in extraction order. A URL
/// that yields nothing contributes an empty block; one bad link never
/// poisons the rest.
pub async fn augment_user_message(
    client: &reqwest::Client,
    text: &str,
    urls: &[String],
) -> String {
    let mut message = text.to_string();
    let mut all_url_content = String::new();
    for url in urls {
        tracing::debug!(url = %url, "Fetching URL content");
        let content = fetch_url_content(client, url).await;
        message = message.replace(&format!("<{url}>"), "");
        all_url_content.push_str(&format!(" Contents of {url} : \n \"\"\" {content} \"\"\""));
    }
    format!("{message}\n{all_url_content}")
}

/// Fetch `url` and reduce the body to readable text. Transport errors,
/// non-success statuses, and undecodable bodies all degrade to an empty
/// string; augmentation never fails the request that triggered it.
pub async fn fetch_url_content(client: &reqwest::Client, url: &str) -> String {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "URL fetch failed");
            return String::new();
        }
    };
    if !response.status().is_success() {
        tracing::debug!(url = %url, status = %response.status(), "URL fetch failed");
        return String::new();
    }
    match response.text().await {
        Ok(body) => extract_readable_text(&body),
        Err(_) => String::new(),
    }
}

/// Reduce fetched markup to whitespace-normalized plain text, capped at
/// [`MAX_CONTENT_CHARS`]. Plain-text bodies pass through unchanged apart
/// from whitespace normalization.
fn extract_readable_text(html: &str) -> String {
    let mut result = html.to_string();
    strip_enclosed(&mut result, "<script", "</script>");
    strip_enclosed(&mut result, "<style", "</style>");

    // Drop remaining tags, replacing each with a space so adjacent text
    // nodes don't fuse.
    let mut text = String::with_capacity(result.len());
    let mut in_tag = false;
    for c in result.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_CONTENT_CHARS)
        .collect()
}

/// Remove every `open`…`close` region, tolerating an unterminated tail.
/// Tag matching is ASCII case-insensitive; `open` and `close` must be
/// given in lowercase.
fn strip_enclosed(html: &mut String, open: &str, close: &str) {
    loop {
        // ASCII lowercasing never changes byte offsets, so positions found
        // in the lowered copy index straight into the original.
        let lower = html.to_ascii_lowercase();
        let start = match lower.find(open) {
            Some(s) => s,
            None => break,
        };
        match lower[start..].find(close) {
            Some(end) => html.replace_range(start..start + end + close.len(), ""),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn strips_tags_scripts_and_styles() {
        let html = "<p>Hello <b>world</b></p><script>alert('test');</script>";
        assert_eq!(extract_readable_text(html), "Hello world");
    }

    #[test]
    fn full_page_reduces_to_body_text() {
        let html = r#"<html><head><title>Test Page</title></head><body><h1>Hello World</h1><p>This is a <b>test</b> paragraph.</p><script>alert('test');</script><style>body { color: red; }</style></body></html>"#;
        let cleaned = extract_readable_text(html);
        assert!(cleaned.contains("Hello World"));
        assert!(cleaned.contains("This is a test paragraph."));
        assert!(!cleaned.contains("alert"));
        assert!(!cleaned.contains("color: red"));
        assert!(!cleaned.contains('<'));
    }

    #[test]
    fn unterminated_script_is_left_alone() {
        let html = "<p>before</p><script>let x = 1;";
        let cleaned = extract_readable_text(html);
        assert!(cleaned.contains("before"));
    }

    #[test]
    fn uppercase_script_and_style_blocks_are_stripped() {
        let html = "<p>visible</p><SCRIPT>var hidden = 1;</SCRIPT><Style>.b { color: red; }</Style>";
        let cleaned = extract_readable_text(html);
        assert!(cleaned.contains("visible"));
        assert!(!cleaned.contains("hidden"));
        assert!(!cleaned.contains("color: red"));
    }

    #[test]
    fn long_content_is_truncated() {
        let html = format!("<p>{}</p>", "a".repeat(20_000));
        assert_eq!(extract_readable_text(&html).chars().count(), MAX_CONTENT_CHARS);
    }

    #[tokio::test]
    async fn augment_appends_fetched_content_and_removes_the_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>Launch plan.</p></body></html>"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/page", server.uri());
        let text = format!("summarize <{url}> please");
        let client = reqwest::Client::new();
        let result = augment_user_message(&client, &text, &[url.clone()]).await;

        let expected =
            format!("summarize  please\n Contents of {url} : \n \"\"\" Launch plan. \"\"\"");
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn failed_fetch_contributes_an_empty_block() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = format!("{}/gone", server.uri());
        let text = format!("look at <{url}>");
        let client = reqwest::Client::new();
        let result = augment_user_message(&client, &text, &[url.clone()]).await;

        let expected = format!("look at \n Contents of {url} : \n \"\"\"  \"\"\"");
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn unreachable_host_contributes_an_empty_block() {
        let url = "http://127.0.0.1:1/nothing".to_string();
        let client = reqwest::Client::new();
        let result = augment_user_message(&client, "see <http://127.0.0.1:1/nothing>", &[url.clone()]).await;
        assert_eq!(
            result,
            format!("see \n Contents of {url} : \n \"\"\"  \"\"\"")
        );
    }

    #[tokio::test]
    async fn multiple_urls_append_blocks_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/first"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>One</p>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/second"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Two</p>"))
            .mount(&server)
            .await;

        let first = format!("{}/first", server.uri());
        let second = format!("{}/second", server.uri());
        let text = format!("compare <{first}> with <{second}>");
        let client = reqwest::Client::new();
        let result = augment_user_message(&client, &text, &[first.clone(), second.clone()]).await;

        let first_block = format!(" Contents of {first} : \n \"\"\" One \"\"\"");
        let second_block = format!(" Contents of {second} : \n \"\"\" Two \"\"\"");
        let first_at = result.find(&first_block).unwrap();
        let second_at = result.find(&second_block).unwrap();
        assert!(first_at < second_at);
        assert!(result.starts_with("compare  with \n"));
    }
}
