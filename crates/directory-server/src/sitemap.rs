//! Sitemap index, child sitemaps and robots.txt

use localbiz_common::Catalog;

pub const BUSINESSES_SITEMAP: &str = "/sitemap-businesses.xml";
pub const LOCATIONS_SITEMAP: &str = "/sitemap-locations.xml";

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Index listing the two child sitemaps
pub fn sitemap_index(base_url: &str) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for path in [BUSINESSES_SITEMAP, LOCATIONS_SITEMAP] {
        xml.push_str(&format!(
            "  <sitemap><loc>{}</loc></sitemap>\n",
            xml_escape(&format!("{base_url}{path}"))
        ));
    }
    xml.push_str("</sitemapindex>\n");
    xml
}

fn urlset(urls: impl Iterator<Item = String>) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        xml.push_str(&format!("  <url><loc>{}</loc></url>\n", xml_escape(&url)));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Directory listing plus every catalog business page
pub fn businesses_sitemap(base_url: &str, catalog: &Catalog) -> String {
    let listing = std::iter::once(format!("{base_url}/businesses"));
    let pages = catalog
        .businesses()
        .map(|b| format!("{base_url}/businesses/{}", b.slug));
    urlset(listing.chain(pages))
}

/// Every catalog location page
pub fn locations_sitemap(base_url: &str, catalog: &Catalog) -> String {
    urlset(
        catalog
            .locations()
            .map(|l| format!("{base_url}{}", l.path())),
    )
}

pub fn robots_txt(base_url: &str) -> String {
    format!("User-agent: *\nAllow: /\nDisallow: /business/new\n\nSitemap: {base_url}/sitemap.xml\n")
}
