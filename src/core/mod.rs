pub mod base_stream;
pub mod cache;
pub mod cancellation;
pub mod chunk_manager;
pub mod config;
pub mod error;
pub mod extractor;
pub mod file_chunked_stream;
pub mod lexer;
pub mod object_store;
pub mod page_tree;
pub mod parser;
pub mod retry;
pub mod stream;
pub mod sub_stream;
pub mod xref;

#[cfg(feature = "async")]
pub mod async_http_chunked_stream;
#[cfg(feature = "async")]
pub mod http_chunked_stream;

pub use base_stream::BaseStream;
pub use cache::{Cache, CacheStats};
pub use cancellation::CancellationHandle;
pub use chunk_manager::{ChunkLoader, ChunkManager};
pub use config::{ContentType, ExtractOptions, ExtractorOptions, ObjectParserOptions, OutputFormat};
pub use error::PDFError;
pub use extractor::{ExtractedContent, ExtractionStatus, Extractor, PageContent, PageRange, PageResult};
pub use file_chunked_stream::FileChunkedStream;
pub use lexer::{Lexer, Token};
pub use object_store::{MemoryStats, ObjectStore};
pub use page_tree::{PageIndex, PageResources};
pub use parser::{PDFObject, Parser, Ref};
pub use stream::Stream;
pub use sub_stream::SubStream;
pub use xref::{Trailer, XRef, XRefEntry};

#[cfg(feature = "async")]
pub use async_http_chunked_stream::{AsyncHttpChunkedStream, ProgressCallback};
#[cfg(feature = "async")]
pub use http_chunked_stream::HttpChunkedStream;
