mod parser;
mod schema;

pub use parser::{mapping_document_schema, parse_mappings};
pub use schema::{RawFieldMapping, RawSubField, SchemaField, SubField};
