//! API request/response models.
//!
//! These types define the JSON wire format. Store-side types (see [`crate::storage`]) are
//! converted into them at the handler boundary.

pub mod files;
