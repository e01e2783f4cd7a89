//! CLI command implementations.

pub(crate) mod download;
pub(crate) mod slots;
pub(crate) mod stream;
