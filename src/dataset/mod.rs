mod load;
mod record;
mod sample;

pub(crate) use load::VECTOR_FILE_SUFFIX;
pub use load::{DatasetCatalog, DatasetOrigin, LoadedDataset};
pub use record::{AttributeValue, EmbeddingRecord, RESERVED_KEYS};
