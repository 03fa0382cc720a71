//! Click and open tracking for outbound HTML.
//!
//! Absolute `http(s)` anchors are rewritten to point at the click redirect
//! endpoint. An unsubscribe footer and a 1x1 open beacon are appended after
//! the rewrite, so the footer link is never click-wrapped. Running the
//! injection twice wraps links twice; callers inject once per rendered body.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use uuid::Uuid;

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<a\s+(?:[^>]*?\s+)?href="([^"]*)""#).expect("valid link regex")
    })
}

/// Public tracking endpoints for one recipient of one campaign.
#[derive(Debug, Clone)]
pub struct TrackingUrls {
    base: String,
    campaign_id: Uuid,
    contact_id: Uuid,
}

impl TrackingUrls {
    pub fn new(base_url: &str, campaign_id: Uuid, contact_id: Uuid) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            campaign_id,
            contact_id,
        }
    }

    pub fn click(&self, target: &str) -> String {
        format!(
            "{}/track/click/{}/{}?url={}",
            self.base,
            self.campaign_id,
            self.contact_id,
            urlencoding::encode(target)
        )
    }

    pub fn open(&self) -> String {
        format!("{}/track/open/{}/{}", self.base, self.campaign_id, self.contact_id)
    }

    pub fn unsubscribe(&self) -> String {
        format!(
            "{}/track/unsubscribe/{}/{}",
            self.base, self.campaign_id, self.contact_id
        )
    }
}

fn is_trackable(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Rewrite trackable links in `html`, then append the unsubscribe footer and
/// the open beacon.
pub fn inject_tracking(html: &str, campaign_id: Uuid, contact_id: Uuid, base_url: &str) -> String {
    let urls = TrackingUrls::new(base_url, campaign_id, contact_id);

    let rewritten = link_pattern().replace_all(html, |caps: &Captures| {
        let whole = &caps[0];
        let href = &caps[1];
        if !is_trackable(href) {
            return whole.to_string();
        }
        // Keep everything up to the opening quote of the href value.
        let prefix_len = whole.len() - href.len() - 1;
        format!("{}{}\"", &whole[..prefix_len], urls.click(href))
    });

    format!(
        "{}<p style=\"font-size:12px;color:#888888\"><a href=\"{}\">Unsubscribe</a></p>\
         <img src=\"{}\" width=\"1\" height=\"1\" alt=\"\" />",
        rewritten,
        urls.unsubscribe(),
        urls.open()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_rewrites_http_links_and_appends_beacon() {
        let (c, k) = ids();
        let html = r#"<p><a class="btn" href="https://shop.example.com/a?b=1&c=2">Shop</a></p>"#;
        let out = inject_tracking(html, c, k, "https://crm.example.com");

        let expected_link = format!(
            r#"<a class="btn" href="https://crm.example.com/track/click/{c}/{k}?url=https%3A%2F%2Fshop.example.com%2Fa%3Fb%3D1%26c%3D2">"#
        );
        assert!(out.contains(&expected_link), "{out}");
        assert!(out.ends_with(&format!(
            r#"<img src="https://crm.example.com/track/open/{c}/{k}" width="1" height="1" alt="" />"#
        )));
    }

    #[test]
    fn test_appends_unwrapped_unsubscribe_link() {
        let (c, k) = ids();
        let out = inject_tracking("<p>hi</p>", c, k, "https://crm.example.com");
        assert!(out.contains(&format!(
            r#"<a href="https://crm.example.com/track/unsubscribe/{c}/{k}">Unsubscribe</a>"#
        )));
        assert!(!out.contains("/track/click/"));
    }

    #[test]
    fn test_leaves_non_http_links_alone() {
        let (c, k) = ids();
        let html = r##"<a href="mailto:hi@example.com">Mail</a><a href="#top">Top</a><a href="/pricing">Rel</a>"##;
        let out = inject_tracking(html, c, k, "http://localhost:8080");
        assert!(out.starts_with(html));
        assert!(!out.contains("/track/click/"));
    }

    #[test]
    fn test_matches_case_insensitively() {
        let (c, k) = ids();
        let out = inject_tracking(r#"<A HREF="HTTP://x.test">x</A>"#, c, k, "http://h");
        assert!(out.contains(&format!("http://h/track/click/{c}/{k}?url=HTTP%3A%2F%2Fx.test")));
    }

    #[test]
    fn test_trims_trailing_slash_on_base() {
        let (c, k) = ids();
        let out = inject_tracking("<p>hi</p>", c, k, "http://localhost:8080/");
        assert!(out.contains(&format!("http://localhost:8080/track/open/{c}/{k}")));
    }

    #[test]
    fn test_double_injection_double_wraps() {
        let (c, k) = ids();
        let once = inject_tracking(r#"<a href="https://a.test">a</a>"#, c, k, "http://h");
        let twice = inject_tracking(&once, c, k, "http://h");
        assert_eq!(twice.matches("<img ").count(), 2);
        assert!(twice.contains("url=http%3A%2F%2Fh%2Ftrack%2Fclick"));
    }
}
