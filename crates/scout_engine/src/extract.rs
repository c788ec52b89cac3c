use scraper::{Html, Selector};

/// Text content of a rendered page's `<body>`, as a script inside the page would read it.
///
/// Falls back to the whole document when there is no body.
pub fn visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next().map(|node| node.text().collect::<String>()));
    body.unwrap_or_else(|| doc.root_element().text().collect())
}
