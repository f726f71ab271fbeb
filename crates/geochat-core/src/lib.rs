//! Types shared by every geochat crate

mod error;

pub use error::HttpError;
