//! Places a candidate's drawn signature into an offer letter

use crate::docx::xml::XmlElement;
use crate::docx::{Block, DocxPackage, Paragraph, Run};
use crate::error::{OfferError, Result};

/// Paragraph texts after which the signature is inserted
pub const SIGNATURE_MARKERS: [&str; 2] = ["Signature:", "Candidate Signature"];
pub const SIGNATURE_HEADING: &str = "Candidate Signature:";

const PNG_MAGIC: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
const EMU_PER_INCH: u64 = 914_400;
const SIGNATURE_WIDTH_INCHES: u64 = 2;

/// Pixel size from a PNG IHDR chunk
pub fn png_dimensions(png: &[u8]) -> Result<(u32, u32)> {
    if png.len() < 24 || &png[..8] != PNG_MAGIC || &png[12..16] != b"IHDR" {
        return Err(OfferError::Validation("signature is not a PNG image".to_string()));
    }

    let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
    let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
    if width == 0 || height == 0 {
        return Err(OfferError::Validation("signature image is empty".to_string()));
    }
    Ok((width, height))
}

/// Drawing extent in EMU: fixed width, height following the aspect ratio
fn signature_extent(width_px: u32, height_px: u32) -> (u64, u64) {
    let cx = SIGNATURE_WIDTH_INCHES * EMU_PER_INCH;
    let cy = cx * u64::from(height_px) / u64::from(width_px);
    (cx, cy)
}

fn inline_picture(rel_id: &str, drawing_id: u32, file_name: &str, cx: u64, cy: u64) -> XmlElement {
    let (cx, cy) = (cx.to_string(), cy.to_string());

    let picture = XmlElement::new("pic:pic")
        .with_attr("xmlns:pic", "http://schemas.openxmlformats.org/drawingml/2006/picture")
        .with_child(
            XmlElement::new("pic:nvPicPr")
                .with_child(
                    XmlElement::new("pic:cNvPr")
                        .with_attr("id", "0")
                        .with_attr("name", file_name),
                )
                .with_child(XmlElement::new("pic:cNvPicPr")),
        )
        .with_child(
            XmlElement::new("pic:blipFill")
                .with_child(
                    XmlElement::new("a:blip")
                        .with_attr(
                            "xmlns:r",
                            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
                        )
                        .with_attr("r:embed", rel_id),
                )
                .with_child(XmlElement::new("a:stretch").with_child(XmlElement::new("a:fillRect"))),
        )
        .with_child(
            XmlElement::new("pic:spPr")
                .with_child(
                    XmlElement::new("a:xfrm")
                        .with_child(XmlElement::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                        .with_child(
                            XmlElement::new("a:ext")
                                .with_attr("cx", cx.as_str())
                                .with_attr("cy", cy.as_str()),
                        ),
                )
                .with_child(
                    XmlElement::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(XmlElement::new("a:avLst")),
                ),
        );

    let inline = XmlElement::new("wp:inline")
        .with_attr(
            "xmlns:wp",
            "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing",
        )
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            XmlElement::new("wp:extent")
                .with_attr("cx", cx.as_str())
                .with_attr("cy", cy.as_str()),
        )
        .with_child(
            XmlElement::new("wp:docPr")
                .with_attr("id", drawing_id.to_string())
                .with_attr("name", "Signature"),
        )
        .with_child(
            XmlElement::new("a:graphic")
                .with_attr("xmlns:a", "http://schemas.openxmlformats.org/drawingml/2006/main")
                .with_child(
                    XmlElement::new("a:graphicData")
                        .with_attr("uri", "http://schemas.openxmlformats.org/drawingml/2006/picture")
                        .with_child(picture),
                ),
        );

    XmlElement::new("w:drawing").with_child(inline)
}

fn is_signature_line(paragraph: &Paragraph) -> bool {
    let text = paragraph.text();
    SIGNATURE_MARKERS.iter().any(|m| text.contains(m))
}

/// Embed `png` and a `Date: <date>` line into the package's main document.
///
/// The signature goes right after the first signature line if the letter has
/// one, otherwise a heading, the image and the date are appended to the body.
pub fn stamp_signature(package: &mut DocxPackage, png: &[u8], date: &str) -> Result<()> {
    let (width, height) = png_dimensions(png)?;
    let (cx, cy) = signature_extent(width, height);

    let index = package
        .part_names()
        .filter(|n| n.starts_with("word/media/signature_"))
        .count()
        + 1;
    let file_name = format!("signature_{}.png", index);
    let rel_id = package.add_image(&file_name, png.to_vec())?;
    let drawing_id = 1000 + u32::try_from(index).unwrap_or(0);

    let mut image_run = Run::new("");
    image_run.push_raw(inline_picture(&rel_id, drawing_id, &file_name, cx, cy));
    let mut image_paragraph = Paragraph::new();
    image_paragraph.push_run(image_run);

    let date_paragraph = Paragraph::from_text(&format!("Date: {}", date));

    let mut document = package.document()?;
    match document.find_paragraph(is_signature_line) {
        Some(at) => {
            log::debug!("Placing signature after block {}", at);
            document.insert_blocks_after(
                at,
                vec![Block::Paragraph(image_paragraph), Block::Paragraph(date_paragraph)],
            );
        }
        None => {
            log::debug!("No signature line found; appending signature block");
            document.append_blocks(vec![
                Block::Paragraph(Paragraph::from_text(SIGNATURE_HEADING)),
                Block::Paragraph(image_paragraph),
                Block::Paragraph(date_paragraph),
            ]);
        }
    }
    package.set_document(&document);
    Ok(())
}
