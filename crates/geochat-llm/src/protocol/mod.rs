//! Wire format types for provider APIs
//!
//! Pure serde structs matching the provider's JSON format, used only at the
//! HTTP boundary.

pub mod openai;
