use rig::embeddings::Embedding;

/// Conversion of rig embeddings into the `f32` vectors the index stores
pub trait EmbeddingConversion {
    fn to_f32_vec(&self) -> Vec<f32>;
    fn to_binary(&self) -> Vec<u8>;
}

impl EmbeddingConversion for Embedding {
    fn to_f32_vec(&self) -> Vec<f32> {
        self.vec.iter().map(|f| *f as f32).collect()
    }

    fn to_binary(&self) -> Vec<u8> {
        vector_to_binary(&self.to_f32_vec())
    }
}

/// Encode a vector as little-endian `f32` bytes
pub fn vector_to_binary(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode little-endian `f32` bytes
///
/// Returns `None` when the length is not a multiple of four.
pub fn vector_from_binary(binary: &[u8]) -> Option<Vec<f32>> {
    if binary.len() % 4 != 0 {
        return None;
    }
    Some(
        binary
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}
