//! HTML pages served by the redirect host

use axum::response::Html;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const EXPIRED_STYLE: &str = "body { font-family: system-ui, sans-serif; display: flex; \
    min-height: 100vh; margin: 0; align-items: center; justify-content: center; \
    background: #f5f5f5; color: #333; } main { text-align: center; padding: 2rem; }";

const FRAME_STYLE: &str = "html, body { height: 100%; margin: 0; } \
    iframe { display: block; width: 100%; height: 100%; border: 0; }";

/// Shared document shell
fn base(title: &str, style: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="robots" content="noindex";
                meta name="referrer" content="no-referrer";
                title { (title) }
                style { (PreEscaped(style)) }
            }
            body { (content) }
        }
    }
}

/// Uniform page for every failed link
#[must_use]
pub fn expired_page(message: &str) -> Html<String> {
    let page = base(
        "Link unavailable",
        EXPIRED_STYLE,
        html! {
            main {
                p { (message) }
            }
        },
    );
    Html(page.into_string())
}

/// Page embedding `url` in a full-size frame
#[must_use]
pub fn frame_page(url: &str) -> Html<String> {
    let page = base(
        "Redirecting",
        FRAME_STYLE,
        html! {
            iframe src=(url) title="content" {}
        },
    );
    Html(page.into_string())
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}
