/// Errors raised by the TaggedValue codec.
///
/// Decoding only fails on malformed JSON; encoding only fails on values JSON
/// cannot represent. Everything an author can get wrong inside a well-formed
/// document degrades to an absent value instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input bytes are not well-formed JSON.
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A `Double` holding NaN or an infinity has no JSON representation.
    #[error("cannot encode non-finite number {value}")]
    NonFinite { value: f64 },
}
