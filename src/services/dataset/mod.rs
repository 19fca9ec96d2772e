//! 数据集下载与解码

mod archive;
mod http;
mod source;

pub use archive::{ExtractedTables, blocks_member, extract_archive, locations_member, read_csv};
pub use http::{HttpDatasetSource, content_disposition_filename, default_archive_name, resolve_uri};
pub use source::{DatasetSource, RawDataset};
