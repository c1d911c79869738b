//! Configuration tests
