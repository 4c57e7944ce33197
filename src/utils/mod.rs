//! Utility modules shared by the knowledge base, engine and stores
//!
//! - Normalization: name folding, plural tolerance, slugs and tags
//! - Vernacular: multi-name fields and display labels
//! - Value helpers: lenient extraction from loosely-typed JSON

pub mod normalization;
pub mod value;
pub mod vernacular;

// Re-export commonly used helpers
pub use normalization::{name_variants, normalize_name, normalize_tag, singular_form, slugify};
pub use value::{get_str, get_string_list, get_u32};
pub use vernacular::{display_label, primary_and_aliases, split_names};
