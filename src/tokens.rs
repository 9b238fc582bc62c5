//! Prompt token counting for model-tier selection.
//!
//! Uses the tiktoken encoder for the model when one is known, otherwise a
//! character estimate (4 chars ≈ 1 token).

use tiktoken_rs::get_bpe_from_model;

/// Count tokens in `text` as `model` would see them.
pub fn count_tokens(model: &str, text: &str) -> usize {
   match get_bpe_from_model(model) {
      Ok(encoder) => encoder.encode_with_special_tokens(text).len(),
      Err(_) => estimate_tokens(text),
   }
}

/// Character-based estimate for models tiktoken does not know.
pub const fn estimate_tokens(text: &str) -> usize {
   text.len().div_ceil(4)
}
