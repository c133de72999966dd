//! DOCX package I/O (zip container of XML parts)

use super::model::Document;
use super::xml::{XmlDocument, XmlElement, XmlNode};
use crate::error::{OfferError, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const IMAGE_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone)]
struct PackagePart {
    name: String,
    data: Vec<u8>,
}

/// All parts of a DOCX file, kept in archive order
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<PackagePart>,
}

impl DocxPackage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            OfferError::Document(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(PackagePart {
                name: file.name().to_string(),
                data,
            });
        }

        let package = Self { parts };
        if package.part(DOCUMENT_PART).is_none() {
            return Err(OfferError::Document(format!("package has no {}", DOCUMENT_PART)));
        }
        Ok(package)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    fn part_str(&self, name: &str) -> Result<String> {
        let data = self
            .part(name)
            .ok_or_else(|| OfferError::Document(format!("package has no {}", name)))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| OfferError::Document(format!("{} is not UTF-8: {}", name, e)))
    }

    /// Replace a part or add it at the end
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart {
                name: name.to_string(),
                data,
            }),
        }
    }

    pub fn document(&self) -> Result<Document> {
        Document::from_xml(&self.part_str(DOCUMENT_PART)?)
    }

    pub fn set_document(&mut self, document: &Document) {
        self.set_part(DOCUMENT_PART, document.to_xml().into_bytes());
    }

    /// Store an image under `word/media/` and register it with the main document.
    /// Returns the new relationship id.
    pub fn add_image(&mut self, file_name: &str, data: Vec<u8>) -> Result<String> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| OfferError::Validation(format!("image '{}' has no extension", file_name)))?;

        self.set_part(&format!("word/media/{}", file_name), data);
        self.ensure_default_content_type(&extension, &format!("image/{}", extension))?;
        self.add_relationship(IMAGE_RELATIONSHIP_TYPE, &format!("media/{}", file_name))
    }

    fn add_relationship(&mut self, rel_type: &str, target: &str) -> Result<String> {
        let mut rels = match self.part(DOCUMENT_RELS_PART) {
            Some(_) => XmlDocument::parse(&self.part_str(DOCUMENT_RELS_PART)?)?,
            None => XmlDocument {
                declaration: true,
                root: XmlElement::new("Relationships").with_attr(
                    "xmlns",
                    "http://schemas.openxmlformats.org/package/2006/relationships",
                ),
            },
        };

        let next = rels
            .root
            .child_elements()
            .filter_map(|r| r.attr("Id"))
            .filter_map(|id| id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);

        rels.root.children.push(XmlNode::Element(
            XmlElement::new("Relationship")
                .with_attr("Id", id.clone())
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        ));
        self.set_part(DOCUMENT_RELS_PART, rels.to_xml().into_bytes());
        Ok(id)
    }

    fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let mut types = XmlDocument::parse(&self.part_str(CONTENT_TYPES_PART)?)?;

        let registered = types.root.child_elements().any(|e| {
            e.name == "Default"
                && e.attr("Extension")
                    .map(|x| x.eq_ignore_ascii_case(extension))
                    .unwrap_or(false)
        });
        if registered {
            return Ok(());
        }

        // Defaults must precede Overrides
        let at = types
            .root
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.name == "Override"))
            .unwrap_or(types.root.children.len());
        types.root.children.insert(
            at,
            XmlNode::Element(
                XmlElement::new("Default")
                    .with_attr("Extension", extension)
                    .with_attr("ContentType", content_type),
            ),
        );
        self.set_part(CONTENT_TYPES_PART, types.to_xml().into_bytes());
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            writer.start_file(part.name.as_str(), options)?;
            writer.write_all(&part.data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}
