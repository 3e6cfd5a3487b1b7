pub mod bootstrap;
pub mod debounce;
pub mod dispatch;
pub mod listing;
pub mod observability;

pub use debounce::{QuerySink, SearchDebouncer};
pub use dispatch::{FetchDispatcher, FetchReport};
pub use listing::{Applied, PostList};
