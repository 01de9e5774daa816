//! Client-side core of an OpenProject wiki integration: named connection
//! management, translation of table filters and sorting into the backend
//! query format, a paginated REST client and a short-lived response cache.
//!
//! [`OpenProject`] is the usual entry point. Given a [`ConnectionRegistry`]
//! and a [`TokenProvider`] it hands out per-connection clients that share
//! one HTTP pool and one cache.

pub mod cache;
pub mod cached_client;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod openproject;
pub mod responses;
pub mod sort;
pub mod types;

pub use cache::{CacheOptions, CachedPage, ResponseCache};
pub use cached_client::CachedClient;
pub use client::ApiClient;
pub use config::{Connection, ConnectionRegistry, TokenProvider};
pub use error::{OpenProjectError, Result};
pub use filter::{
    convert_filters, convert_stored_filters, merge_filters, parse_stored_filters, Constraint,
    Filter, StoredFilter,
};
pub use openproject::{AvatarLookup, OpenProject};
pub use responses::PaginatedResult;
pub use sort::{convert_sorting, merge_sorting, SortEntry};
pub use types::{
    FieldValue, Linkable, Priority, Project, Status, User, UserAvatar, WorkPackage,
    WorkPackageType,
};
