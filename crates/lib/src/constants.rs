//! Constants used throughout the docmapper library.

/// Field holding a document's identity in the backing store.
pub const ID_FIELD: &str = "_id";

/// Default database name when configuration does not provide one.
pub const DEFAULT_DATABASE: &str = "docmapper";

/// Default collection name when configuration does not provide one.
pub const DEFAULT_COLLECTION: &str = "documents";

/// Environment variable overriding the configured database name.
pub const ENV_DATABASE: &str = "DOCMAPPER_DATABASE";

/// Environment variable overriding the configured collection name.
pub const ENV_COLLECTION: &str = "DOCMAPPER_COLLECTION";

/// Environment variable overriding the configured durability mode.
pub const ENV_DURABILITY: &str = "DOCMAPPER_DURABILITY";

/// Largest array index a document path may address.
pub const MAX_ARRAY_INDEX: usize = 100_000;
