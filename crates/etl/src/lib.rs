//! Extract, transform, and load stages for Pipewright jobs.
//!
//! Each stage is independent: the [`Extractor`] reads records from a
//! source kind, the [`Transformer`] applies an ordered list of
//! declarative transformations, and the [`Loader`] writes records to a
//! target kind with per-record success/failure accounting.

#![warn(missing_docs)]

mod connector;
mod extract;
mod load;
mod transform;

pub use connector::Connector;
pub use extract::{ExtractError, Extractor};
pub use load::{LoadError, Loader};
pub use transform::{TransformError, Transformer};
