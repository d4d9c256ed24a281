//! Data model for exported Bodymovin/Lottie documents.
//!
//! The types mirror the JSON field names one to one so documents round-trip
//! through serde without a translation layer. Interpretation lives in
//! `lottie-runtime`.

pub mod model;

pub use model::Document;
