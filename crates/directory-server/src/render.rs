//! HTML page rendering
//!
//! Every page goes through [`layout`], which owns the `<head>`: title, meta
//! description, canonical link, Open Graph tags and the JSON-LD scripts.
//! All record text is escaped on the way in.

use localbiz_common::form::MIN_DESCRIPTION_CHARS;
use localbiz_common::structured_data::{
    breadcrumb_list, local_business, location_business, to_script_json, Crumb,
};
use localbiz_common::{BusinessForm, BusinessRecord, FormErrors, LocationRecord, PriceRange, Result};
use std::collections::BTreeSet;

use crate::backend::{StoredBusiness, User};

/// Per-request values every page needs
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub site_name: &'a str,
    pub base_url: &'a str,
    pub user: Option<&'a User>,
}

impl PageContext<'_> {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn home(&self) -> Crumb {
        Crumb::new("Home", self.url("/"))
    }

    fn directory(&self) -> Crumb {
        Crumb::new("Businesses", self.url("/businesses"))
    }
}

struct Head {
    title: String,
    description: String,
    canonical: Option<String>,
    image: Option<String>,
    json_ld: Vec<String>,
    noindex: bool,
}

/// Escape text for HTML element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Meta descriptions are cut at a word boundary near 160 characters
fn meta_description(text: &str) -> String {
    const LIMIT: usize = 160;
    let text = text.trim();
    if text.chars().count() <= LIMIT {
        return text.to_string();
    }
    let cut: String = text.chars().take(LIMIT - 3).collect();
    let cut = match cut.rfind(' ') {
        Some(i) => &cut[..i],
        None => cut.as_str(),
    };
    format!("{}...", cut.trim_end_matches([',', '.', ';', ':']))
}

fn layout(ctx: &PageContext<'_>, head: Head, body: &str) -> String {
    let mut html = String::with_capacity(body.len() + 2048);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>{} | {}</title>\n",
        escape(&head.title),
        escape(ctx.site_name)
    ));
    html.push_str(&format!(
        "<meta name=\"description\" content=\"{}\">\n",
        escape(&head.description)
    ));
    if head.noindex {
        html.push_str("<meta name=\"robots\" content=\"noindex\">\n");
    }
    if let Some(canonical) = &head.canonical {
        html.push_str(&format!(
            "<link rel=\"canonical\" href=\"{}\">\n",
            escape(canonical)
        ));
        html.push_str(&format!(
            "<meta property=\"og:url\" content=\"{}\">\n",
            escape(canonical)
        ));
    }
    html.push_str(&format!(
        "<meta property=\"og:title\" content=\"{}\">\n",
        escape(&head.title)
    ));
    html.push_str(&format!(
        "<meta property=\"og:description\" content=\"{}\">\n",
        escape(&head.description)
    ));
    html.push_str(&format!(
        "<meta property=\"og:site_name\" content=\"{}\">\n",
        escape(ctx.site_name)
    ));
    if let Some(image) = &head.image {
        html.push_str(&format!(
            "<meta property=\"og:image\" content=\"{}\">\n",
            escape(image)
        ));
    }
    for script in &head.json_ld {
        html.push_str("<script type=\"application/ld+json\">");
        html.push_str(script);
        html.push_str("</script>\n");
    }
    html.push_str("</head>\n<body>\n");
    html.push_str(&header(ctx));
    html.push_str("<main>\n");
    html.push_str(body);
    html.push_str("</main>\n");
    html.push_str(&footer(ctx));
    html.push_str("</body>\n</html>\n");
    html
}

fn header(ctx: &PageContext<'_>) -> String {
    let account = match ctx.user {
        Some(user) => format!(
            "<span class=\"account\">Signed in as {}</span>",
            escape(&user.display_name)
        ),
        None => String::new(),
    };
    format!(
        "<header>\n<a class=\"brand\" href=\"/\">{}</a>\n<nav>\n\
         <a href=\"/businesses\">Browse businesses</a>\n\
         <a href=\"/business/new\">List your business</a>\n\
         {}\n</nav>\n</header>\n",
        escape(ctx.site_name),
        account
    )
}

fn footer(ctx: &PageContext<'_>) -> String {
    format!(
        "<footer>\n<p>{}</p>\n<nav><a href=\"/businesses\">Directory</a> \
         <a href=\"/sitemap.xml\">Sitemap</a></nav>\n</footer>\n",
        escape(ctx.site_name)
    )
}

fn breadcrumbs_nav(crumbs: &[Crumb]) -> String {
    let items: Vec<String> = crumbs
        .iter()
        .enumerate()
        .map(|(i, crumb)| {
            if i + 1 == crumbs.len() {
                format!("<li aria-current=\"page\">{}</li>", escape(&crumb.name))
            } else {
                format!(
                    "<li><a href=\"{}\">{}</a></li>",
                    escape(&crumb.url),
                    escape(&crumb.name)
                )
            }
        })
        .collect();
    format!(
        "<nav aria-label=\"Breadcrumb\"><ol class=\"breadcrumbs\">{}</ol></nav>\n",
        items.concat()
    )
}

fn rating_line(record: &BusinessRecord) -> String {
    if record.review_count == 0 {
        return format!(
            "<p class=\"rating\">No reviews yet · {}</p>\n",
            escape(record.price_range.symbol())
        );
    }
    format!(
        "<p class=\"rating\">{:.1} / 5 ({} reviews) · {}</p>\n",
        record.rating,
        record.review_count,
        escape(record.price_range.symbol())
    )
}

fn hours_table(record: &BusinessRecord) -> String {
    let rows: Vec<String> = record
        .hours
        .iter()
        .map(|(day, text)| {
            format!(
                "<tr><th scope=\"row\">{}</th><td>{}</td></tr>",
                day.name(),
                escape(text)
            )
        })
        .collect();
    format!(
        "<section class=\"hours\">\n<h2>Hours</h2>\n<table>{}</table>\n</section>\n",
        rows.concat()
    )
}

fn contact_section(record: &BusinessRecord) -> String {
    let mut html = String::from("<section class=\"contact\">\n<h2>Contact</h2>\n<address>\n");
    html.push_str(&format!("{}<br>\n", escape(&record.address.street)));
    html.push_str(&format!(
        "{}, {} {}<br>\n",
        escape(&record.address.city),
        escape(&record.address.state),
        escape(&record.address.postal_code)
    ));
    html.push_str(&format!(
        "<a href=\"tel:{}\">{}</a><br>\n",
        escape(&phone_digits(&record.contact.phone)),
        escape(&record.contact.phone)
    ));
    if let Some(website) = &record.contact.website {
        html.push_str(&format!(
            "<a href=\"{}\" rel=\"noopener\">{}</a><br>\n",
            escape(website),
            escape(website)
        ));
    }
    if let Some(email) = &record.contact.email {
        html.push_str(&format!(
            "<a href=\"mailto:{}\">{}</a><br>\n",
            escape(email),
            escape(email)
        ));
    }
    html.push_str("</address>\n</section>\n");
    html
}

fn phone_digits(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

fn list_section(class: &str, title: &str, items: impl Iterator<Item = impl AsRef<str>>) -> String {
    let items: Vec<String> = items
        .map(|item| format!("<li>{}</li>", escape(item.as_ref())))
        .collect();
    if items.is_empty() {
        return String::new();
    }
    format!(
        "<section class=\"{}\">\n<h2>{}</h2>\n<ul>{}</ul>\n</section>\n",
        class,
        escape(title),
        items.concat()
    )
}

fn gallery(record: &BusinessRecord) -> String {
    let featured = record.featured_image();
    let images: Vec<String> = record
        .images
        .iter()
        .filter(|url| Some(url.as_str()) != featured)
        .map(|url| {
            format!(
                "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                escape(url),
                escape(&record.name)
            )
        })
        .collect();
    if images.is_empty() {
        return String::new();
    }
    format!(
        "<section class=\"gallery\">\n<h2>Photos</h2>\n{}\n</section>\n",
        images.concat()
    )
}

fn faq_section(record: &BusinessRecord) -> String {
    if record.faqs.is_empty() {
        return String::new();
    }
    let items: Vec<String> = record
        .faqs
        .iter()
        .map(|faq| {
            format!(
                "<details><summary>{}</summary><p>{}</p></details>",
                escape(&faq.question),
                escape(&faq.answer)
            )
        })
        .collect();
    format!(
        "<section class=\"faq\">\n<h2>Frequently asked questions</h2>\n{}\n</section>\n",
        items.join("\n")
    )
}

/// Hero, rating, description, contact, hours, amenities, areas, photos, FAQ
fn profile(record: &BusinessRecord, heading: &str) -> String {
    let mut html = String::new();
    html.push_str("<article class=\"business\">\n");
    if let Some(image) = record.featured_image() {
        html.push_str(&format!(
            "<img class=\"hero\" src=\"{}\" alt=\"{}\">\n",
            escape(image),
            escape(&record.name)
        ));
    }
    html.push_str(&format!("<h1>{}</h1>\n", escape(heading)));
    html.push_str(&format!(
        "<p class=\"category\">{}</p>\n",
        escape(&record.category)
    ));
    html.push_str(&rating_line(record));
    if !record.description.is_empty() {
        html.push_str(&format!(
            "<p class=\"description\">{}</p>\n",
            escape(&record.description)
        ));
    }
    html.push_str(&contact_section(record));
    html.push_str(&hours_table(record));
    html.push_str(&list_section("amenities", "Amenities", record.amenities.iter()));
    html.push_str(&list_section(
        "service-areas",
        "Areas served",
        record.service_areas.iter(),
    ));
    html.push_str(&gallery(record));
    html.push_str(&faq_section(record));
    html.push_str("</article>\n");
    html
}

fn location_links(locations: &[&LocationRecord], title: &str) -> String {
    if locations.is_empty() {
        return String::new();
    }
    let items: Vec<String> = locations
        .iter()
        .map(|l| {
            let primary = if l.is_primary { " (main location)" } else { "" };
            format!(
                "<li><a href=\"{}\">{}</a>{} · {}</li>",
                escape(&l.path()),
                escape(&l.location_name),
                primary,
                escape(&l.record.address.one_line())
            )
        })
        .collect();
    format!(
        "<section class=\"locations\">\n<h2>{}</h2>\n<ul>{}</ul>\n</section>\n",
        escape(title),
        items.concat()
    )
}

/// Catalog business profile page
pub fn business_page(
    ctx: &PageContext<'_>,
    record: &BusinessRecord,
    locations: &[&LocationRecord],
) -> Result<String> {
    let canonical = ctx.url(&format!("/businesses/{}", record.slug));
    let crumbs = [
        ctx.home(),
        ctx.directory(),
        Crumb::new(record.name.clone(), canonical.clone()),
    ];

    let mut body = breadcrumbs_nav(&crumbs);
    body.push_str(&profile(record, &record.name));
    body.push_str(&location_links(locations, "Locations"));

    let head = Head {
        title: format!("{} - {} in {}", record.name, record.category, record.address.city),
        description: meta_description(&record.description),
        image: record.featured_image().map(str::to_string),
        json_ld: vec![
            to_script_json(&local_business(record, &canonical))?,
            to_script_json(&breadcrumb_list(&crumbs))?,
        ],
        canonical: Some(canonical),
        noindex: false,
    };
    Ok(layout(ctx, head, &body))
}

/// Per-location marketing page
pub fn location_page(
    ctx: &PageContext<'_>,
    location: &LocationRecord,
    parent: &BusinessRecord,
    siblings: &[&LocationRecord],
) -> Result<String> {
    let parent_url = ctx.url(&format!("/businesses/{}", parent.slug));
    let canonical = ctx.url(&location.path());
    let crumbs = [
        ctx.home(),
        ctx.directory(),
        Crumb::new(parent.name.clone(), parent_url.clone()),
        Crumb::new(location.location_name.clone(), canonical.clone()),
    ];
    let structured = location_business(location, &canonical, parent, &parent_url);

    let others: Vec<&LocationRecord> = siblings
        .iter()
        .copied()
        .filter(|l| l.location_slug() != location.location_slug())
        .collect();

    let mut body = breadcrumbs_nav(&crumbs);
    body.push_str(&profile(&location.record, &structured.name));
    body.push_str(&format!(
        "<p class=\"parent\">Part of <a href=\"{}\">{}</a></p>\n",
        escape(&format!("/businesses/{}", parent.slug)),
        escape(&parent.name)
    ));
    body.push_str(&location_links(&others, "Other locations"));

    let head = Head {
        title: format!(
            "{} {} - {}, {}",
            parent.name,
            location.location_name,
            location.record.address.city,
            location.record.address.state
        ),
        description: meta_description(&location.record.description),
        image: location.record.featured_image().map(str::to_string),
        json_ld: vec![
            to_script_json(&structured)?,
            to_script_json(&breadcrumb_list(&crumbs))?,
        ],
        canonical: Some(canonical),
        noindex: false,
    };
    Ok(layout(ctx, head, &body))
}

/// Page for a business created through the form
pub fn stored_business_page(ctx: &PageContext<'_>, stored: &StoredBusiness) -> Result<String> {
    let record = &stored.record;
    let canonical = ctx.url(&stored.path());
    let crumbs = [
        ctx.home(),
        Crumb::new(record.name.clone(), canonical.clone()),
    ];

    let mut body = breadcrumbs_nav(&crumbs);
    body.push_str(&profile(record, &record.name));
    body.push_str(&format!(
        "<p class=\"listed\">Listed {}</p>\n",
        stored.created_at.format("%B %-d, %Y")
    ));

    let head = Head {
        title: format!("{} - {}", record.name, record.category),
        description: meta_description(&record.description),
        image: record.featured_image().map(str::to_string),
        json_ld: vec![
            to_script_json(&local_business(record, &canonical))?,
            to_script_json(&breadcrumb_list(&crumbs))?,
        ],
        canonical: Some(canonical),
        noindex: false,
    };
    Ok(layout(ctx, head, &body))
}

/// Directory listing, optionally filtered to one category
pub fn directory_page(
    ctx: &PageContext<'_>,
    businesses: &[&BusinessRecord],
    categories: &BTreeSet<&str>,
    selected: Option<&str>,
) -> Result<String> {
    let canonical = ctx.url("/businesses");
    let crumbs = [ctx.home(), ctx.directory()];

    let mut body = breadcrumbs_nav(&crumbs);
    body.push_str("<h1>Local businesses</h1>\n");

    let filters: Vec<String> = categories
        .iter()
        .map(|c| {
            let current = if Some(*c) == selected {
                " aria-current=\"true\""
            } else {
                ""
            };
            format!(
                "<li><a href=\"/businesses?category={}\"{}>{}</a></li>",
                escape(&urlencoding::encode(c)),
                current,
                escape(c)
            )
        })
        .collect();
    body.push_str(&format!(
        "<nav class=\"categories\"><ul><li><a href=\"/businesses\">All</a></li>{}</ul></nav>\n",
        filters.concat()
    ));

    if businesses.is_empty() {
        body.push_str("<p class=\"empty\">No businesses found.</p>\n");
    } else {
        body.push_str("<ul class=\"directory\">\n");
        for record in businesses {
            let thumb = record
                .featured_image()
                .map(|url| {
                    format!(
                        "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                        escape(url),
                        escape(&record.name)
                    )
                })
                .unwrap_or_default();
            body.push_str(&format!(
                "<li>{}<a href=\"/businesses/{}\">{}</a> <span class=\"category\">{}</span> \
                 <span class=\"city\">{}</span></li>\n",
                thumb,
                escape(&record.slug),
                escape(&record.name),
                escape(&record.category),
                escape(&record.address.city)
            ));
        }
        body.push_str("</ul>\n");
    }

    let title = match selected {
        Some(category) => format!("{} near you", category),
        None => "Local business directory".to_string(),
    };
    let head = Head {
        description: format!(
            "Browse {} local businesses: hours, contact details, photos and reviews.",
            businesses.len()
        ),
        title,
        image: None,
        json_ld: vec![to_script_json(&breadcrumb_list(&crumbs))?],
        canonical: Some(canonical),
        // Filtered views duplicate the canonical listing
        noindex: selected.is_some(),
    };
    Ok(layout(ctx, head, &body))
}

fn text_input(form_field: &str, label: &str, value: &str, errors: &FormErrors, required: bool) -> String {
    let required_attr = if required { " required" } else { "" };
    format!(
        "<label for=\"{f}\">{l}</label>\n<input id=\"{f}\" name=\"{f}\" value=\"{v}\"{r}>\n{e}",
        f = form_field,
        l = escape(label),
        v = escape(value),
        r = required_attr,
        e = field_error(form_field, errors)
    )
}

fn textarea(form_field: &str, label: &str, value: &str, errors: &FormErrors) -> String {
    format!(
        "<label for=\"{f}\">{l}</label>\n<textarea id=\"{f}\" name=\"{f}\">{v}</textarea>\n{e}",
        f = form_field,
        l = escape(label),
        v = escape(value),
        e = field_error(form_field, errors)
    )
}

fn field_error(form_field: &str, errors: &FormErrors) -> String {
    match errors.get(form_field) {
        Some(message) => format!(
            "<p class=\"field-error\" id=\"{}-error\">{}</p>\n",
            form_field,
            escape(message)
        ),
        None => String::new(),
    }
}

/// Business creation form, re-rendered with the submitted values on error
pub fn create_form_page(ctx: &PageContext<'_>, form: &BusinessForm, errors: &FormErrors) -> String {
    let mut body = String::from("<h1>List your business</h1>\n");
    body.push_str(&field_error("form", errors));
    body.push_str("<form method=\"post\" action=\"/business/new\">\n");

    body.push_str(&text_input("name", "Business name", &form.name, errors, true));
    body.push_str(&text_input("category", "Category", &form.category, errors, true));
    body.push_str(&format!(
        "<label for=\"description\">Description</label>\n\
         <textarea id=\"description\" name=\"description\" minlength=\"{}\" required>{}</textarea>\n{}",
        MIN_DESCRIPTION_CHARS,
        escape(&form.description),
        field_error("description", errors)
    ));

    let options: Vec<String> = PriceRange::ALL
        .iter()
        .map(|p| {
            let selected = if form.price_range == p.symbol() {
                " selected"
            } else {
                ""
            };
            format!("<option value=\"{0}\"{1}>{0}</option>", p.symbol(), selected)
        })
        .collect();
    body.push_str(&format!(
        "<label for=\"price_range\">Price range</label>\n\
         <select id=\"price_range\" name=\"price_range\" required>\
         <option value=\"\">Choose...</option>{}</select>\n{}",
        options.concat(),
        field_error("price_range", errors)
    ));

    body.push_str("<fieldset><legend>Address</legend>\n");
    body.push_str(&text_input("street", "Street", &form.street, errors, true));
    body.push_str(&text_input("city", "City", &form.city, errors, true));
    body.push_str(&text_input("state", "State", &form.state, errors, true));
    body.push_str(&text_input("postal_code", "Postal code", &form.postal_code, errors, true));
    body.push_str(&text_input("country", "Country", &form.country, errors, false));
    body.push_str("</fieldset>\n");

    body.push_str("<fieldset><legend>Contact</legend>\n");
    body.push_str(&text_input("phone", "Phone", &form.phone, errors, true));
    body.push_str(&text_input("website", "Website", &form.website, errors, false));
    body.push_str(&text_input("email", "Email", &form.email, errors, false));
    body.push_str("</fieldset>\n");

    body.push_str("<fieldset><legend>Photos</legend>\n");
    body.push_str(&textarea("images", "Image URLs (one per line)", &form.images, errors));
    body.push_str(&text_input(
        "featured_image",
        "Featured image URL (defaults to the first image)",
        &form.featured_image,
        errors,
        false,
    ));
    body.push_str("</fieldset>\n");

    body.push_str(&text_input(
        "amenities",
        "Amenities (comma separated)",
        &form.amenities,
        errors,
        false,
    ));
    body.push_str(&text_input(
        "service_areas",
        "Areas served (comma separated)",
        &form.service_areas,
        errors,
        false,
    ));

    body.push_str("<fieldset><legend>Hours (leave blank if closed)</legend>\n");
    for (field, label, value) in [
        ("hours_monday", "Monday", &form.hours_monday),
        ("hours_tuesday", "Tuesday", &form.hours_tuesday),
        ("hours_wednesday", "Wednesday", &form.hours_wednesday),
        ("hours_thursday", "Thursday", &form.hours_thursday),
        ("hours_friday", "Friday", &form.hours_friday),
        ("hours_saturday", "Saturday", &form.hours_saturday),
        ("hours_sunday", "Sunday", &form.hours_sunday),
    ] {
        body.push_str(&text_input(field, label, value, errors, false));
    }
    body.push_str("</fieldset>\n");

    body.push_str("<button type=\"submit\">Create listing</button>\n</form>\n");

    let head = Head {
        title: "List your business".to_string(),
        description: "Add your business to the directory.".to_string(),
        canonical: None,
        image: None,
        json_ld: Vec::new(),
        noindex: true,
    };
    layout(ctx, head, &body)
}

pub fn not_found_page(ctx: &PageContext<'_>) -> String {
    let head = Head {
        title: "Page not found".to_string(),
        description: "The page you are looking for does not exist.".to_string(),
        canonical: None,
        image: None,
        json_ld: Vec::new(),
        noindex: true,
    };
    let body = "<h1>Page not found</h1>\n\
                <p>We couldn't find that business. <a href=\"/businesses\">Browse the directory</a>.</p>\n";
    layout(ctx, head, body)
}

pub fn error_page(ctx: &PageContext<'_>) -> String {
    let head = Head {
        title: "Something went wrong".to_string(),
        description: "An unexpected error occurred.".to_string(),
        canonical: None,
        image: None,
        json_ld: Vec::new(),
        noindex: true,
    };
    let body = "<h1>Something went wrong</h1>\n<p>Please try again in a moment.</p>\n";
    layout(ctx, head, body)
}
