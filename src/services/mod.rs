pub mod format;
pub mod images;
pub mod providers;
pub mod queries;

pub use images::{BackdropSize, ImageUrls, PosterSize, ProfileSize};
pub use providers::{MovieCatalog, TmdbClient};
pub use queries::{MovieQueries, QueryResult, QueryStatus};
