//! Fragment libraries and bag-of-fragments (BOF) vectors.
//!
//! A fragment library is a fixed set of short backbone templates, all of the
//! same length K. Any protein chain can be summarized as a histogram over
//! the library — its *bag of fragments* — by sliding a K-sized window along
//! the chain's alpha carbons and counting, for each window, the library
//! fragment with minimal superposition RMSD.
//!
//! - **Libraries** — [`FragmentLibrary`] parsing and nearest-fragment lookup
//! - **Vectors** — [`Bow`] counts with cosine/euclidean metrics, [`BowDiff`]
//! - **Building** — the [`BowSource`] capability and [`BowBuilder`]
//! - **HHfrag** — [`hhfrag::FragmentMap`], a query-side source built from
//!   HMM template hits
//!
//! ```
//! use physalia_frag::bow::Bow;
//!
//! let mut bow = Bow::new(4);
//! bow.increment(1);
//! bow.increment(1);
//! bow.increment(3);
//! assert_eq!(bow.to_string(), "{1: 2, 3: 1}");
//! ```

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bow;
pub mod diff;
pub mod hhfrag;
pub mod library;
pub mod source;

pub use bow::Bow;
pub use diff::BowDiff;
pub use library::{Fragment, FragmentLibrary};
pub use source::{BowBuilder, BowSource, ChainSource};
