//! DOCX reading, editing and writing

pub mod model;
pub mod package;
pub mod xml;

pub use model::{Block, Cell, Document, Item, Paragraph, Row, Run, RunFormat, Table};
pub use package::{DocxPackage, DOCX_MIME_TYPE};
