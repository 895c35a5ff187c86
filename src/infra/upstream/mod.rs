//! HTTP implementations of the upstream client traits.

mod catalog;
mod cms;

pub use catalog::CatalogHttpClient;
pub use cms::CmsClient;
