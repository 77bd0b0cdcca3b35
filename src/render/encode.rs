//! Serializes a laid-out [`PdfDocument`] with lopdf.
//!
//! Layout works top-down; PDF user space grows upward, so every y is flipped
//! against the page height here.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::canvas::{DrawOp, Page};
use super::color::Rgb;
use super::metrics::ASCENT_FACTOR;
use super::pdf::{DocumentInfo, PdfDocument};
use super::RenderError;

const FONT_NAME: &[u8] = b"F1";

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// Map text onto WinAnsiEncoding bytes; unmappable characters become '?'.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{00A0}'..='\u{00FF}' => c as u32 as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            _ => b'?',
        })
        .collect()
}

/// Text strings in the Info dictionary use PDFDocEncoding; Latin-1 is a safe subset.
fn info_string(text: &str) -> Object {
    Object::string_literal(win_ansi(text))
}

fn pdf_date(info: &DocumentInfo) -> Object {
    Object::string_literal(info.created.format("D:%Y%m%d%H%M%SZ").to_string())
}

fn set_fill(ops: &mut Vec<Operation>, color: Rgb) {
    let [r, g, b] = color.unit();
    ops.push(Operation::new("rg", vec![real(r), real(g), real(b)]));
}

fn set_stroke(ops: &mut Vec<Operation>, color: Rgb) {
    let [r, g, b] = color.unit();
    ops.push(Operation::new("RG", vec![real(r), real(g), real(b)]));
}

fn page_operations(page: &Page, height: f32) -> Vec<Operation> {
    let mut ops = Vec::new();

    for op in &page.ops {
        match op {
            DrawOp::FillRect {
                x,
                y,
                width,
                height: h,
                color,
            } => {
                set_fill(&mut ops, *color);
                ops.push(Operation::new(
                    "re",
                    vec![real(*x), real(height - y - h), real(*width), real(*h)],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            DrawOp::StrokeRect {
                x,
                y,
                width,
                height: h,
                color,
            } => {
                set_stroke(&mut ops, *color);
                ops.push(Operation::new("w", vec![real(1.0)]));
                ops.push(Operation::new(
                    "re",
                    vec![real(*x), real(height - y - h), real(*width), real(*h)],
                ));
                ops.push(Operation::new("S", vec![]));
            }
            DrawOp::Text {
                x,
                y,
                text,
                size,
                color,
                word_spacing,
            } => {
                if text.is_empty() {
                    continue;
                }
                let baseline = height - (y + size * ASCENT_FACTOR);
                set_fill(&mut ops, *color);
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![Object::Name(FONT_NAME.to_vec()), real(*size)],
                ));
                ops.push(Operation::new("Tw", vec![real(*word_spacing)]));
                ops.push(Operation::new("Td", vec![real(*x), real(baseline)]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(win_ansi(text))],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
            } => {
                set_stroke(&mut ops, *color);
                ops.push(Operation::new("w", vec![real(0.75)]));
                ops.push(Operation::new("m", vec![real(*x1), real(height - y1)]));
                ops.push(Operation::new("l", vec![real(*x2), real(height - y2)]));
                ops.push(Operation::new("S", vec![]));
            }
            DrawOp::Link { .. } => {}
        }
    }

    ops
}

fn link_annotations(page: &Page, height: f32) -> Vec<Object> {
    page.ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Link {
                x,
                y,
                width,
                height: h,
                uri,
            } => Some(Object::Dictionary(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Link",
                "Rect" => vec![real(*x), real(height - y - h), real(x + width), real(height - y)],
                "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
                "A" => dictionary! {
                    "S" => "URI",
                    "URI" => Object::string_literal(uri.as_bytes().to_vec()),
                },
            })),
            _ => None,
        })
        .collect()
}

fn add_page(
    doc: &mut Document,
    page: &Page,
    pages_id: ObjectId,
    resources_id: ObjectId,
    media_box: &[Object],
    height: f32,
) -> Result<ObjectId, RenderError> {
    let content = Content {
        operations: page_operations(page, height),
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

    let mut page_dict = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => media_box.to_vec(),
    };
    let annots = link_annotations(page, height);
    if !annots.is_empty() {
        page_dict.set("Annots", annots);
    }

    Ok(doc.add_object(page_dict))
}

/// Encode the document to PDF bytes.
pub fn encode(document: &PdfDocument) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let media_box = vec![real(0.0), real(0.0), real(document.width), real(document.height)];
    let mut kids = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let page_id = add_page(
            &mut doc,
            page,
            pages_id,
            resources_id,
            &media_box,
            document.height,
        )?;
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info = &document.info;
    let info_id = doc.add_object(dictionary! {
        "Title" => info_string(&info.title),
        "Author" => info_string(&info.author),
        "Subject" => info_string(&info.subject),
        "Creator" => info_string(&info.creator),
        "Producer" => info_string(&info.creator),
        "CreationDate" => pdf_date(info),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn document(pages: Vec<Page>) -> PdfDocument {
        PdfDocument {
            width: 595.28,
            height: 841.89,
            info: DocumentInfo {
                title: "Selected Works".into(),
                author: "Amani".into(),
                subject: "Professional Portfolio".into(),
                creator: "KatikaNaMe Platform".into(),
                created: Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap(),
            },
            pages,
        }
    }

    #[test]
    fn test_win_ansi_maps_bullet_and_latin1() {
        assert_eq!(win_ansi("a \u{2022} b"), vec![b'a', b' ', 0x95, b' ', b'b']);
        assert_eq!(win_ansi("caf\u{e9}"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(win_ansi("\u{4e2d}"), vec![b'?']);
    }

    #[test]
    fn test_encoded_document_reloads_with_page_count_and_info() {
        let mut first = Page::default();
        first.ops.push(DrawOp::Text {
            x: 50.0,
            y: 80.0,
            text: "Hello".into(),
            size: 12.0,
            color: Rgb(0, 0, 0),
            word_spacing: 0.0,
        });
        let mut second = Page::default();
        second.ops.push(DrawOp::Link {
            x: 50.0,
            y: 200.0,
            width: 100.0,
            height: 14.0,
            uri: "https://example.com".into(),
        });

        let bytes = encode(&document(vec![first, second])).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);

        let info_id = reloaded.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = reloaded.get_dictionary(info_id).unwrap();
        assert_eq!(
            info.get(b"Author").unwrap().as_str().unwrap(),
            b"Amani".as_slice()
        );
    }

    #[test]
    fn test_rectangles_are_flipped_to_pdf_space() {
        let mut page = Page::default();
        page.ops.push(DrawOp::FillRect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 200.0,
            color: Rgb(1, 2, 3),
        });
        let ops = page_operations(&page, 841.89);
        let re = ops.iter().find(|op| op.operator == "re").unwrap();
        let bottom = re.operands[1].as_float().unwrap();
        assert!((bottom - 641.89).abs() < 1e-2);
    }
}
