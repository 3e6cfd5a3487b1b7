pub mod error;
pub mod posts;
pub mod types;
pub mod utils;

pub use error::FetchError;
pub use posts::{FetchTarget, PostFetcher};
pub use types::Post;
