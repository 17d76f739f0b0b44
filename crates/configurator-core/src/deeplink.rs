//! Deep-link query parameters and share links.

use crate::constants::{PARAM_AR, PARAM_COLOR, PARAM_ENVIRONMENT, PARAM_MOBILE, PARAM_STRAP};
use crate::state::SelectionState;
use url::Url;

/// Overrides read from the page URL at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlParams {
    pub color: Option<String>,
    pub strap: Option<String>,
    pub environment: Option<String>,
    /// `ar=true`: hand off to AR as soon as the model is ready.
    pub ar: bool,
    /// `mobile=true`: force the mobile layout.
    pub force_mobile: bool,
}

impl UrlParams {
    /// Parse `location.search` (leading `?` optional).
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut out = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                PARAM_COLOR if !value.is_empty() => out.color = Some(value.to_string()),
                PARAM_STRAP if !value.is_empty() => out.strap = Some(value.to_string()),
                PARAM_ENVIRONMENT if !value.is_empty() => {
                    out.environment = Some(value.to_string())
                }
                PARAM_AR => out.ar = value == "true",
                PARAM_MOBILE => out.force_mobile = value == "true",
                _ => {}
            }
        }
        out
    }

    pub fn from_url(page_url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(page_url)?;
        Ok(Self::from_query(url.query().unwrap_or("")))
    }

    #[inline]
    pub fn has_selection(&self) -> bool {
        self.color.is_some() || self.strap.is_some() || self.environment.is_some()
    }
}

/// `page_url` with the selection written as `color`/`strap`/`environment`.
///
/// Existing selection parameters are replaced; unrelated parameters and the
/// fragment are kept.
pub fn share_url(page_url: &str, state: &SelectionState) -> Result<String, url::ParseError> {
    let mut url = Url::parse(page_url)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !matches!(k.as_ref(), PARAM_COLOR | PARAM_STRAP | PARAM_ENVIRONMENT))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut q = url.query_pairs_mut();
        q.clear();
        q.extend_pairs(kept);
        q.append_pair(PARAM_COLOR, &state.color);
        q.append_pair(PARAM_STRAP, &state.strap);
        q.append_pair(PARAM_ENVIRONMENT, &state.environment);
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SelectionState {
        SelectionState {
            color: "midnight blue".into(),
            strap: "selected".into(),
            environment: "studio".into(),
        }
    }

    #[test]
    fn parses_all_parameters() {
        let p = UrlParams::from_query("?color=red&strap=leather&environment=beach&ar=true&mobile=true");
        assert_eq!(p.color.as_deref(), Some("red"));
        assert_eq!(p.strap.as_deref(), Some("leather"));
        assert_eq!(p.environment.as_deref(), Some("beach"));
        assert!(p.ar);
        assert!(p.force_mobile);
        assert!(p.has_selection());
    }

    #[test]
    fn flags_require_literal_true() {
        let p = UrlParams::from_query("ar=1&mobile=yes&color=");
        assert!(!p.ar);
        assert!(!p.force_mobile);
        assert_eq!(p.color, None);
        assert!(!p.has_selection());
    }

    #[test]
    fn share_url_replaces_selection_and_keeps_the_rest() {
        let url = share_url("https://shop.example.com/watch?color=red&utm_source=mail#top", &state())
            .unwrap();
        assert!(url.starts_with("https://shop.example.com/watch?utm_source=mail&color=midnight+blue"));
        assert!(url.ends_with("#top"));
        let back = UrlParams::from_url(&url).unwrap();
        assert_eq!(back.color.as_deref(), Some("midnight blue"));
        assert_eq!(back.strap.as_deref(), Some("selected"));
        assert_eq!(back.environment.as_deref(), Some("studio"));
    }

    #[test]
    fn share_url_rejects_relative_input() {
        assert!(share_url("/watch", &state()).is_err());
    }
}
