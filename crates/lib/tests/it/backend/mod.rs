//! In-memory backend tests
