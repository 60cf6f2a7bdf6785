//! Listing page extraction
//!
//! Listing pages never link to a business website directly; the outbound link
//! goes through a redirect path (e.g. `/biz_redir?url=https%3A%2F%2F...`).

use scraper::{Html, Selector};
use url::form_urlencoded;

/// Finds the business website behind the first redirect link on a listing page
///
/// Returns `None` when the page has no redirect link, or when the first one
/// carries no `url` parameter. A missing website is an expected outcome, not
/// an error.
///
/// # Example
///
/// ```
/// use listing_harvest::extract::extract_website;
///
/// let html = r#"<a href="/biz_redir?url=https%3A%2F%2Fshop.example%2F&cachebuster=1">Site</a>"#;
/// assert_eq!(
///     extract_website(html, "/biz_redir"),
///     Some("https://shop.example/".to_string())
/// );
/// ```
pub fn extract_website(markup: &str, redirect_prefix: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    let selector = Selector::parse(&format!("a[href^='{}']", redirect_prefix)).ok()?;

    let href = document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))?;

    redirect_target(href)
}

/// Decodes the `url` query parameter of a redirect href
fn redirect_target(href: &str) -> Option<String> {
    let (_, query) = href.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);

    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "/biz_redir";

    #[test]
    fn test_extracts_decoded_website() {
        let html = r#"
            <html><body>
                <a href="/biz/other-shop">Other</a>
                <a href="/biz_redir?url=https%3A%2F%2Fwww.goldengate.example%2Fcontact&amp;website_link_type=website&amp;src_bizid=abc">goldengate.example</a>
            </body></html>
        "#;

        assert_eq!(
            extract_website(html, PREFIX),
            Some("https://www.goldengate.example/contact".to_string())
        );
    }

    #[test]
    fn test_uses_first_redirect_link() {
        let html = r#"
            <a href="/biz_redir?url=https%3A%2F%2Ffirst.example">First</a>
            <a href="/biz_redir?url=https%3A%2F%2Fsecond.example">Second</a>
        "#;

        assert_eq!(
            extract_website(html, PREFIX),
            Some("https://first.example".to_string())
        );
    }

    #[test]
    fn test_no_redirect_link() {
        let html = r#"<html><body><a href="https://elsewhere.example">Direct</a></body></html>"#;
        assert_eq!(extract_website(html, PREFIX), None);
    }

    #[test]
    fn test_redirect_link_without_url_param() {
        let html = r#"<a href="/biz_redir?src_bizid=abc">Site</a>"#;
        assert_eq!(extract_website(html, PREFIX), None);
    }

    #[test]
    fn test_absolute_links_do_not_match_prefix() {
        let html = r#"<a href="https://www.yelp.com/biz_redir?url=https%3A%2F%2Fx.example">Site</a>"#;
        assert_eq!(extract_website(html, PREFIX), None);
    }

    #[test]
    fn test_plus_decodes_to_space() {
        assert_eq!(
            redirect_target("/biz_redir?url=https%3A%2F%2Fx.example%2Fa+b"),
            Some("https://x.example/a b".to_string())
        );
    }

    #[test]
    fn test_empty_markup() {
        assert_eq!(extract_website("", PREFIX), None);
    }
}
