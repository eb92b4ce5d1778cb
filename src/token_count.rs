// src/token_count.rs

#[cfg(feature = "tokenizer-tiktoken")]
mod imp {
    use once_cell::sync::Lazy;
    use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

    // Prefer o200k_base for current models; fall back to cl100k_base.
    static BPE: Lazy<Option<CoreBPE>> = Lazy::new(|| match o200k_base().or_else(|_| cl100k_base()) {
        Ok(bpe) => Some(bpe),
        Err(err) => {
            log::warn!("tokenizer unavailable, estimating from length: {}", err);
            None
        }
    });

    pub fn count_tokens(text: &str) -> usize {
        match BPE.as_ref() {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => super::estimate(text),
        }
    }
}

#[cfg(not(feature = "tokenizer-tiktoken"))]
mod imp {
    pub fn count_tokens(text: &str) -> usize {
        super::estimate(text)
    }
}

/// Rough 4-chars-per-token estimate.
fn estimate(text: &str) -> usize {
    (text.chars().count() as f32 / 4.0).ceil() as usize
}

pub use imp::count_tokens;
