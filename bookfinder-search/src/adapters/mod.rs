//! Source adapter implementations.
//!
//! Each adapter implements [`SourceAdapter`](crate::adapter::SourceAdapter)
//! and differs only in how it retrieves records.

pub mod bookstore;
pub mod ebook_library;
pub mod library;
pub mod local;
pub mod storefront;
pub mod subscription;

pub use bookstore::BookstoreAdapter;
pub use ebook_library::EbookLibraryAdapter;
pub use library::PublicLibraryAdapter;
pub use local::LocalHoldingsAdapter;
pub use storefront::StorefrontAdapter;
pub use subscription::{
    PortalBackend, PortalCredentials, SessionBackend, SubscriptionAdapter,
};
