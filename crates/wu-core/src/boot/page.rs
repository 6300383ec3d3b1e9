//! Page identity.
//!
//! Identity comes from `<meta name="wu-page">` when present, else from the
//! fixed route patterns, else from the URL's file name without extension.

use std::fmt;

use url::Url;

/// Meta tag naming the page explicitly.
pub const PAGE_META: &str = "wu-page";

/// Origin that bare paths are resolved against.
const LOCAL_BASE: &str = "http://localhost/";

/// Every page the loader knows module lists for, plus a catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageKind {
    Home,
    Login,
    Tryouts,
    TryoutDetail,
    Talent,
    WrestlerProfile,
    MyWrestlerProfile,
    MyPromoterProfile,
    Dashboard,
    /// A page without a module list of its own.
    Other(String),
}

impl PageKind {
    /// Classify an identity string such as `index` or `profile_wrestler`.
    #[must_use]
    pub fn from_identity(identity: &str) -> Self {
        match identity.trim().to_ascii_lowercase().as_str() {
            "" | "index" | "home" => Self::Home,
            "login" | "signin" => Self::Login,
            "tryouts" => Self::Tryouts,
            "tryout" | "tryout_detail" | "tryout-detail" => Self::TryoutDetail,
            "talent" | "wrestlers" => Self::Talent,
            "wrestler" | "wrestler_profile" | "wrestler-profile" => Self::WrestlerProfile,
            "profile_wrestler" | "profile-wrestler" => Self::MyWrestlerProfile,
            "profile_promoter" | "profile-promoter" => Self::MyPromoterProfile,
            "dashboard" | "promoter_dashboard" => Self::Dashboard,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Canonical identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Home => "home",
            Self::Login => "login",
            Self::Tryouts => "tryouts",
            Self::TryoutDetail => "tryout",
            Self::Talent => "talent",
            Self::WrestlerProfile => "wrestler",
            Self::MyWrestlerProfile => "profile_wrestler",
            Self::MyPromoterProfile => "profile_promoter",
            Self::Dashboard => "dashboard",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The page's URL, split into path and decoded query pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLocation {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl PageLocation {
    /// Parse an absolute URL or a path with optional query and fragment.
    ///
    /// Paths are resolved against a fixed local origin; input that still
    /// fails to parse yields the site root.
    #[must_use]
    pub fn parse(url: &str) -> Self {
        let parsed = Url::parse(url).or_else(|_| Url::parse(LOCAL_BASE)?.join(url));
        let Ok(parsed) = parsed else {
            return Self {
                path: "/".to_owned(),
                query: Vec::new(),
            };
        };
        let path = match parsed.path() {
            "" => "/",
            p => p,
        };
        Self {
            path: path.to_owned(),
            query: parsed.query_pairs().into_owned().collect(),
        }
    }

    /// First value of query parameter `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), std::borrow::Cow::into_owned)
}

/// Resolved identity of the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIdentity {
    pub kind: PageKind,
    /// Route parameter: wrestler handle or tryout id.
    pub param: Option<String>,
}

impl PageIdentity {
    /// Resolve from the optional meta override and the location.
    #[must_use]
    pub fn resolve(meta: Option<&str>, location: &PageLocation) -> Self {
        let routed = match meta.map(str::trim).filter(|m| !m.is_empty()) {
            Some(name) => Self {
                kind: PageKind::from_identity(name),
                param: None,
            },
            None => Self::from_path(&location.path),
        };

        let param = routed.param.or_else(|| {
            let key = match routed.kind {
                PageKind::WrestlerProfile => "handle",
                PageKind::TryoutDetail => "id",
                _ => return None,
            };
            location
                .query_param(key)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        });

        Self {
            kind: routed.kind,
            param,
        }
    }

    fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Self {
                kind: PageKind::Home,
                param: None,
            },
            ["w", handle] => Self {
                kind: PageKind::WrestlerProfile,
                param: Some(decode_segment(handle)),
            },
            ["tryouts", id] if !id.contains('.') => Self {
                kind: PageKind::TryoutDetail,
                param: Some(decode_segment(id)),
            },
            [.., file] => {
                let stem = file.rsplit_once('.').map_or(*file, |(stem, _)| stem);
                Self {
                    kind: PageKind::from_identity(&decode_segment(stem)),
                    param: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(meta: Option<&str>, url: &str) -> PageIdentity {
        PageIdentity::resolve(meta, &PageLocation::parse(url))
    }

    #[test]
    fn route_patterns() {
        assert_eq!(resolve(None, "/").kind, PageKind::Home);
        assert_eq!(
            resolve(None, "/w/kid-lightning"),
            PageIdentity {
                kind: PageKind::WrestlerProfile,
                param: Some("kid-lightning".to_owned())
            }
        );
        assert_eq!(
            resolve(None, "https://wu.example.com/tryouts/42?ref=home"),
            PageIdentity {
                kind: PageKind::TryoutDetail,
                param: Some("42".to_owned())
            }
        );
    }

    #[test]
    fn file_name_fallback() {
        assert_eq!(resolve(None, "/index.html").kind, PageKind::Home);
        assert_eq!(resolve(None, "/tryouts.html").kind, PageKind::Tryouts);
        assert_eq!(resolve(None, "/tryouts/list.html").kind, PageKind::Other("list".to_owned()));
        assert_eq!(resolve(None, "/profile_promoter.html").kind, PageKind::MyPromoterProfile);
        assert_eq!(resolve(None, "/about.html").kind, PageKind::Other("about".to_owned()));
    }

    #[test]
    fn meta_overrides_path_and_query_supplies_param() {
        let id = resolve(Some("wrestler"), "/profile.html?handle=El%20Toro");
        assert_eq!(id.kind, PageKind::WrestlerProfile);
        assert_eq!(id.param.as_deref(), Some("El Toro"));

        let id = resolve(Some(" dashboard "), "/w/ignored");
        assert_eq!(id, PageIdentity { kind: PageKind::Dashboard, param: None });

        let id = resolve(None, "/tryout.html?id=7");
        assert_eq!(id.kind, PageKind::TryoutDetail);
        assert_eq!(id.param.as_deref(), Some("7"));
    }

    #[test]
    fn location_parsing() {
        let loc = PageLocation::parse("https://wu.example.com?x=1&flag#top");
        assert_eq!(loc.path, "/");
        assert_eq!(loc.query_param("x"), Some("1"));
        assert_eq!(loc.query_param("flag"), Some(""));
        assert_eq!(loc.query_param("missing"), None);
    }

    #[test]
    fn location_decodes_query_and_keeps_plus_in_path() {
        let loc = PageLocation::parse("/w/a+b?handle=El+Toro&note=caf%C3%A9#bio");
        assert_eq!(loc.path, "/w/a+b");
        assert_eq!(loc.query_param("handle"), Some("El Toro"));
        assert_eq!(loc.query_param("note"), Some("café"));
        assert_eq!(resolve(None, "/w/a+b").param.as_deref(), Some("a+b"));

        let loc = PageLocation::parse("tryouts.html?id=3");
        assert_eq!(loc.path, "/tryouts.html");
        assert_eq!(loc.query_param("id"), Some("3"));
    }
}
