//! Deep links: the review position as a URL fragment.

mod codec;
mod sync;

pub use codec::{DeepLink, LinkFocus};
pub use sync::HashSynchronizer;
