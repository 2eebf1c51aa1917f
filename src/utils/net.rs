use url::Url;

use crate::error::{PtoolError, PtoolResult};

/// Append `path` to the path of `base_url`, keeping any path the base already has
pub fn join_url(base_url: &str, path: &str) -> PtoolResult<Url> {
    let mut url = Url::parse(base_url.trim())?;

    url.path_segments_mut()
        .map_err(|_| {
            PtoolError::Invalid(
                "URL_CANNOT_BE_BASE",
                format!("'{base_url}' can not be used as a base URL"),
            )
        })?
        .pop_if_empty()
        .extend(path.split('/').filter(|s| !s.is_empty()));

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.openai.com/v1", "/chat/completions")
                .unwrap()
                .as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            join_url("https://api.openai.com/v1/", "chat/completions")
                .unwrap()
                .as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            join_url(
                "https://generativelanguage.googleapis.com/v1beta",
                "/models/gemini-2.5-pro:generateContent"
            )
            .unwrap()
            .as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro:generateContent"
        );
        assert_eq!(
            join_url("http://127.0.0.1:8080", "/chat/completions")
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8080/chat/completions"
        );
        assert!(join_url("not a url", "/foo").is_err());
    }
}
