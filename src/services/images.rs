//! Image URL helpers
//!
//! The catalog only returns relative paths (`/abc.jpg`); the image CDN serves
//! them under `<base>/<size>/<path>`. A missing path maps to a bundled
//! placeholder asset instead.

use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub const POSTER_PLACEHOLDER: &str = "/placeholder-movie.svg";
pub const BACKDROP_PLACEHOLDER: &str = "/placeholder-backdrop.svg";
pub const PROFILE_PLACEHOLDER: &str = "/placeholder-profile.svg";

/// Declares a size enum with its text form and default variant
macro_rules! image_sizes {
    ($name:ident, default = $default:ident, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnsupportedSize;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(UnsupportedSize(other.to_string())),
                }
            }
        }
    };
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported image size: {0}")]
pub struct UnsupportedSize(pub String);

image_sizes!(PosterSize, default = W500, {
    W92 => "w92",
    W154 => "w154",
    W185 => "w185",
    W342 => "w342",
    W500 => "w500",
    W780 => "w780",
    Original => "original",
});

image_sizes!(BackdropSize, default = Original, {
    W300 => "w300",
    W780 => "w780",
    W1280 => "w1280",
    Original => "original",
});

image_sizes!(ProfileSize, default = W185, {
    W45 => "w45",
    W185 => "w185",
    H632 => "h632",
    Original => "original",
});

/// Builds image CDN URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn poster(&self, path: Option<&str>, size: PosterSize) -> String {
        self.build(path, size.as_str(), POSTER_PLACEHOLDER)
    }

    pub fn backdrop(&self, path: Option<&str>, size: BackdropSize) -> String {
        self.build(path, size.as_str(), BACKDROP_PLACEHOLDER)
    }

    pub fn profile(&self, path: Option<&str>, size: ProfileSize) -> String {
        self.build(path, size.as_str(), PROFILE_PLACEHOLDER)
    }

    fn build(&self, path: Option<&str>, size: &str, placeholder: &str) -> String {
        match path.map(|p| p.trim_start_matches('/')) {
            Some(p) if !p.is_empty() => format!("{}/{}/{}", self.base, size, p),
            _ => placeholder.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> ImageUrls {
        ImageUrls::new("https://image.tmdb.org/t/p")
    }

    #[test]
    fn test_poster_url() {
        assert_eq!(
            urls().poster(Some("/abc.jpg"), PosterSize::W500),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
    }

    #[test]
    fn test_missing_paths_use_placeholders() {
        assert_eq!(urls().poster(None, PosterSize::W500), POSTER_PLACEHOLDER);
        assert_eq!(urls().poster(Some(""), PosterSize::W92), POSTER_PLACEHOLDER);
        assert_eq!(
            urls().backdrop(None, BackdropSize::Original),
            BACKDROP_PLACEHOLDER
        );
        assert_eq!(urls().profile(None, ProfileSize::W185), PROFILE_PLACEHOLDER);
    }

    #[test]
    fn test_trailing_slash_in_base() {
        let urls = ImageUrls::new("http://cdn.local/");
        assert_eq!(
            urls.profile(Some("/p.png"), ProfileSize::H632),
            "http://cdn.local/h632/p.png"
        );
    }

    #[test]
    fn test_size_defaults() {
        assert_eq!(PosterSize::default(), PosterSize::W500);
        assert_eq!(BackdropSize::default(), BackdropSize::Original);
        assert_eq!(ProfileSize::default(), ProfileSize::W185);
    }

    #[test]
    fn test_size_parsing() {
        assert_eq!("w780".parse::<PosterSize>(), Ok(PosterSize::W780));
        assert_eq!("w1280".parse::<BackdropSize>(), Ok(BackdropSize::W1280));
        assert!("w1280".parse::<PosterSize>().is_err());
        assert_eq!(ProfileSize::H632.to_string(), "h632");
    }
}
