pub mod feed;
pub mod pipeline;
pub mod token_cache;
pub mod ws_listener;

pub use feed::FeedError;
pub use pipeline::Pipeline;
pub use token_cache::{TokenCache, TokenMeta};
