//! On-disk bag-of-fragments databases and similarity search.
//!
//! A database is a directory holding a byte-identical copy of its fragment
//! library (`frag.lib`) and a binary file of length-prefixed entry records
//! (`bow.db`). Once created and closed it is immutable.
//!
//! - **Writing** — [`DbWriter`] computes entries on a worker pool and
//!   appends them in arrival order
//! - **Reading** — [`Database::open`] eagerly loads every entry
//! - **Searching** — bounded top-K search under cosine or euclidean
//!   distance, via [`Database::search`] and [`Database::search_entry`]

pub mod codec;
pub mod db;
pub mod rank;
pub mod search;

pub use db::{Database, DbWriter, Entry, WriteOptions};
pub use rank::RankedSet;
pub use search::{Metric, Order, SearchOptions, SearchResult};
