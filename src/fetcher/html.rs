// src/fetcher/html.rs
// =============================================================================
// This module pulls the page title out of an HTML document.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser), which never rejects input;
//   broken markup is repaired the same way a browser would repair it
//
// Rust concepts:
// - Option<T>: "there may be no title"
// - Iterators: For walking the text nodes of an element
// - &str: the body arrives already decoded by the HTTP layer
// =============================================================================

use scraper::{Html, Selector};

// Extracts the text of the first <title> element found anywhere in the page
//
// Parameters:
//   body: the response body, already decoded to text
//
// Returns: Some(title) or None when the page has no usable title
//
// Decoding is the caller's job: reqwest knows the Content-Type charset,
// this function only sees text.
//
// Example:
//   body = "<html><head><title> Rust \n Lang </title></head></html>"
//   result = Some("Rust Lang")
pub fn extract_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);

    // "title" is a constant, known-valid selector
    let selector = Selector::parse("title").expect("static selector is valid");

    let element = document.select(&selector).next()?;

    // Collapse runs of whitespace (titles often span several lines)
    let title = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why take &str instead of &[u8]?
//    - Turning bytes into text needs the page's charset
//    - The charset lives in the Content-Type header, which only the HTTP
//      layer sees, so that is where decoding happens (Response::text)
//
// 2. What does the ? after .next() do?
//    - .next() returns Option<ElementRef>
//    - In a function returning Option, ? returns None early if there's
//      no element
//
// 3. What is flat_map(str::split_whitespace)?
//    - element.text() yields every text node inside <title>
//    - split_whitespace splits each of them into words
//    - flat_map flattens "iterator of iterators" into one stream of words
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_from_head() {
        let html = "<html><head><title>Example Domain</title></head><body></body></html>";
        assert_eq!(extract_title(html), Some("Example Domain".to_string()));
    }

    #[test]
    fn test_title_outside_head() {
        let html = "<body><div><title>Stray Title</title></div></body>";
        assert_eq!(extract_title(html), Some("Stray Title".to_string()));
    }

    #[test]
    fn test_first_title_wins() {
        let html = "<title>First</title><title>Second</title>";
        assert_eq!(extract_title(html), Some("First".to_string()));
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let html = "<title>\n   Rust\n\t Programming   Language \n</title>";
        assert_eq!(
            extract_title(html),
            Some("Rust Programming Language".to_string())
        );
    }

    #[test]
    fn test_missing_title() {
        let html = "<html><head></head><body><h1>No title here</h1></body></html>";
        assert_eq!(extract_title(html), None);
    }

    #[test]
    fn test_empty_title() {
        let html = "<html><head><title>   </title></head></html>";
        assert_eq!(extract_title(html), None);
    }

    #[test]
    fn test_non_ascii_title_is_kept_intact() {
        let html = "<title>Caf\u{e9} \u{65e5}\u{672c}</title>";
        assert_eq!(extract_title(html), Some("Café 日本".to_string()));
    }

    #[test]
    fn test_plain_text_body() {
        assert_eq!(extract_title("just some text"), None);
    }
}
