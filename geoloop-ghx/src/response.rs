//! G-function tables and their on-disk cache.
//!
//! A [`ResponseTable`] is the interpolating view of a [`GFunctionCurve`].
//! [`ResponseCache`] persists the [`GFunctionData`] computed for one
//! borefield, keyed by a [`Fingerprint`] of everything the curve depends on.

mod cache;
mod fingerprint;
mod table;

pub use cache::ResponseCache;
pub use fingerprint::Fingerprint;
pub use table::{GFunctionCurve, GFunctionData, ResponseTable};
