//! Poster media URL derivation.

/// Derives the public media URL for a poster from its ID.
///
/// The URL is a pure function of the poster ID under the configured base;
/// it is never stored on a schedule.
#[derive(Debug, Clone)]
pub struct MediaLocator {
    base_url: String,
}

impl MediaLocator {
    pub fn new(media_base_url: &str) -> Self {
        Self {
            base_url: media_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn poster_url(&self, poster_id: &str) -> String {
        format!("{}/posters/{}.jpg", self.base_url, poster_id)
    }
}
