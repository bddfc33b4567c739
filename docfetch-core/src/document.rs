//! The document type returned by fetch operations, and conversions out of it.
//!
//! Documents are schemaless: an ordered mapping from field names to dynamically typed
//! values. [`DocumentExt`] turns one into a typed value or into JSON for display.

use bson::{Bson, de::deserialize_from_bson};
use serde::de::DeserializeOwned;
use serde_json::{Value, to_value};

use crate::error::FetchResult;

/// An ordered mapping of field names to dynamically typed values.
pub type Document = bson::Document;

/// Conversion helpers for fetched documents.
pub trait DocumentExt {
    /// Decodes the document into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`](crate::error::FetchError::Decode) if the document
    /// does not have the shape `T` expects.
    fn decode<T: DeserializeOwned>(&self) -> FetchResult<T>;

    /// Renders the document as a JSON value.
    fn to_json(&self) -> FetchResult<Value>;
}

impl DocumentExt for Document {
    fn decode<T: DeserializeOwned>(&self) -> FetchResult<T> {
        Ok(deserialize_from_bson(Bson::Document(self.clone()))?)
    }

    fn to_json(&self) -> FetchResult<Value> {
        Ok(to_value(self)?)
    }
}
