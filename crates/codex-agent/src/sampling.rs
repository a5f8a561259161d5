//! Per-model sampling parameter tables.

/// Completion settings sent with every inference request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// None = backend default.
    pub top_k: Option<u32>,
    pub repeat_penalty: f32,
    /// Extra stop sequences on top of the model's own end-of-generation token.
    pub stop: &'static [&'static str],
}

impl SamplingParams {
    /// Primary model: low temperature, no extra stop markers.
    pub const PRIMARY: SamplingParams = SamplingParams {
        max_tokens: 100,
        temperature: 0.2,
        top_p: 0.1,
        top_k: None,
        repeat_penalty: 1.1,
        stop: &[],
    };

    /// Secondary model: stops at end-of-turn markers or the first newline.
    pub const SECONDARY: SamplingParams = SamplingParams {
        max_tokens: 100,
        temperature: 0.1,
        top_p: 0.1,
        top_k: Some(10),
        repeat_penalty: 1.1,
        stop: &["<|im_end|>", "<|im_start|>", "\n"],
    };
}
