use crate::error::Result;

/// Text to fixed-dimension vector capability used by the clusterer.
///
/// Implementations must be deterministic for a given model version: the
/// same keyword list always yields the same vectors.
pub trait Embedder {
    /// One vector per input text, in input order.
    fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

#[cfg(feature = "fastembed")]
pub use local::FastEmbedder;

#[cfg(feature = "fastembed")]
mod local {
    use std::path::PathBuf;

    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

    use super::Embedder;
    use crate::error::{AppError, Result};

    /// Local ONNX sentence-embedding model.
    pub struct FastEmbedder {
        model: TextEmbedding,
        model_name: String,
        embedding_dimension: usize,
    }

    fn model_by_name(name: &str) -> Option<(EmbeddingModel, usize)> {
        let model = match name.to_ascii_lowercase().as_str() {
            "all-minilm-l6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
            "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
            "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
            "bge-large-en-v1.5" => (EmbeddingModel::BGELargeENV15, 1024),
            "nomic-embed-text-v1.5" => (EmbeddingModel::NomicEmbedTextV15, 768),
            "paraphrase-multilingual-minilm-l12-v2" => (EmbeddingModel::ParaphraseMLMiniLML12V2, 384),
            "paraphrase-multilingual-mpnet-base-v2" => (EmbeddingModel::ParaphraseMLMpnetBaseV2, 768),
            _ => return None,
        };
        Some(model)
    }

    impl FastEmbedder {
        /// Loads (downloading on first use) the named model.
        ///
        /// Any failure here means clustering cannot run at all, so it is
        /// reported as a missing capability.
        pub fn new(model_name: &str, cache_dir: Option<&str>) -> Result<Self> {
            let (model_type, embedding_dimension) = model_by_name(model_name).ok_or_else(|| {
                AppError::MissingCapability(format!("Unsupported embedding model '{}'", model_name))
            })?;

            let mut init_options = InitOptions::new(model_type);
            if let Some(dir) = cache_dir {
                init_options = init_options.with_cache_dir(PathBuf::from(dir));
            }

            let model = TextEmbedding::try_new(init_options).map_err(|e| {
                AppError::MissingCapability(format!("Failed to initialize embedding model: {}", e))
            })?;
            tracing::info!("Loaded embedding model {}", model_name);

            Ok(Self {
                model,
                model_name: model_name.to_string(),
                embedding_dimension,
            })
        }
    }

    impl Embedder for FastEmbedder {
        fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let embeddings = self.model.embed(texts.to_vec(), None)?;
            Ok(embeddings)
        }

        fn dimension(&self) -> usize {
            self.embedding_dimension
        }

        fn model_name(&self) -> &str {
            &self.model_name
        }
    }

    impl std::fmt::Debug for FastEmbedder {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FastEmbedder")
                .field("model_name", &self.model_name)
                .field("embedding_dimension", &self.embedding_dimension)
                .finish()
        }
    }

}
