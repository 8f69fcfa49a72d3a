//! sitemap.xml for the public pages

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use kaushiru_common::time::{now, utc_date};

use crate::AppState;

/// Path, change frequency, priority
const PAGES: &[(&str, &str, &str)] = &[
    ("", "daily", "1.0"),
    ("/kau", "daily", "0.8"),
    ("/shiru", "daily", "0.8"),
    ("/contact", "monthly", "0.5"),
    ("/terms", "monthly", "0.5"),
    ("/privacy", "monthly", "0.5"),
];

pub fn render_sitemap(base_url: &str, lastmod: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for (path, changefreq, priority) in PAGES {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
            base_url, path, lastmod, changefreq, priority
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// GET /sitemap.xml
pub async fn sitemap(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        render_sitemap(&state.base_url, &utc_date(now())),
    )
}

pub fn site_routes() -> Router<AppState> {
    Router::new().route("/sitemap.xml", get(sitemap))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sitemap() {
        let xml = render_sitemap("https://example.test/", "2024-05-01");
        assert!(xml.starts_with("<?xml"));
        assert_eq!(xml.matches("<url>").count(), 6);
        assert!(xml.contains("<loc>https://example.test</loc>"));
        assert!(xml.contains("<loc>https://example.test/kau</loc>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
        assert!(xml.contains("<lastmod>2024-05-01</lastmod>"));
    }
}
