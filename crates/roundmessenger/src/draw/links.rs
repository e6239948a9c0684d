// Trailing link paragraphs appended to each assignment message.

/// Turns a participant's private-link key into a full URL. Implemented by the
/// draw provider, which owns the URL layout.
pub trait PrivateUrls {
    fn private_url_from_key(&self, key: &str) -> String;
}

/// Compose the link text appended to a message body: the meeting link for the
/// venue's category (if any), then the participant's private URL (if any).
pub fn compose_links<P: PrivateUrls + ?Sized>(
    private_urls: &P,
    category_url: &str,
    url_key: &str,
) -> String {
    let mut links = String::new();

    if !category_url.is_empty() {
        links.push_str(&format!("\n\nThe link to your Zoom room is {category_url}."));
    }

    if !url_key.is_empty() {
        let private_url = private_urls.private_url_from_key(url_key);
        links.push_str(&format!("\n\nYour private URL is {private_url}."));
    }

    links
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
