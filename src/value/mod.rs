//! Dynamic value model for heliodb
//!
//! `Dynamic` is the untyped representation the accessor consumes and
//! produces: scalars, keyed containers, indexed containers, null, and live
//! wrappers over stored objects, lists, and results. Every value resolves
//! to exactly one `Shape`, and coercion code dispatches on that shape
//! instead of probing piecemeal.
//!
//! JSON is the outer carrier: `Dynamic::from_json` / `Dynamic::to_json`
//! convert losslessly, with binary data carried as base64 text and
//! timestamps as RFC 3339 text.

mod dynamic;
mod json;

pub use dynamic::{Dynamic, Shape};
