use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Field a genre listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Popularity,
    ReleaseDate,
    VoteAverage,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Ordering of a discovery listing, written `field.direction` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported sort key: {0}")]
pub struct ParseSortKeyError(pub String);

impl SortKey {
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Every supported combination, in the order a picker lists them
    pub fn all() -> [SortKey; 8] {
        use SortDirection::*;
        use SortField::*;
        [
            Self::new(Popularity, Desc),
            Self::new(Popularity, Asc),
            Self::new(ReleaseDate, Desc),
            Self::new(ReleaseDate, Asc),
            Self::new(VoteAverage, Desc),
            Self::new(VoteAverage, Asc),
            Self::new(Title, Asc),
            Self::new(Title, Desc),
        ]
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::new(SortField::Popularity, SortDirection::Desc)
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let field = match self.field {
            SortField::Popularity => "popularity",
            SortField::ReleaseDate => "release_date",
            SortField::VoteAverage => "vote_average",
            SortField::Title => "title",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}.{}", field, direction)
    }
}

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s
            .split_once('.')
            .ok_or_else(|| ParseSortKeyError(s.to_string()))?;

        let field = match field {
            "popularity" => SortField::Popularity,
            "release_date" => SortField::ReleaseDate,
            "vote_average" => SortField::VoteAverage,
            "title" => SortField::Title,
            _ => return Err(ParseSortKeyError(s.to_string())),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(ParseSortKeyError(s.to_string())),
        };

        Ok(Self::new(field, direction))
    }
}

impl TryFrom<String> for SortKey {
    type Error = ParseSortKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}
