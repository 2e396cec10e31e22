//! PDF encoding of a laid-out report
//!
//! Draw commands use a top-left origin; PDF user space has its origin at the
//! bottom-left, so every y is flipped against the page height here and only here.
//! Text is re-wrapped with the exact `TextStyle` and box width the layout
//! measured with.

use crate::font::{encode_win_ansi, FontFace};
use crate::layout::{
    self, Color, DrawCommand, LayoutOptions, Page, RectCommand, ReportLayout, TextCommand,
};
use crate::record::EvaluationRecord;
use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

/// Stroke width used for table and swatch borders
const LINE_WIDTH: f32 = 1.0;

/// How a client should present the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    /// `download` requests an attachment, otherwise the PDF is shown inline
    pub fn from_download_flag(download: bool) -> Self {
        if download {
            Disposition::Attachment
        } else {
            Disposition::Inline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

/// Encoded report ready to be served or written to disk
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub filename: String,
    pub disposition: Disposition,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

impl PdfDocument {
    pub fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    /// Value for a `Content-Disposition` header
    pub fn content_disposition(&self) -> String {
        format!("{}; filename={}", self.disposition.as_str(), self.filename)
    }
}

/// File name used for a record's report
pub fn report_filename(id: &str) -> String {
    format!("IPERC_{}.pdf", id)
}

/// Lay out and encode a record
pub fn render_pdf(
    record: &EvaluationRecord,
    options: &LayoutOptions,
    disposition: Disposition,
) -> Result<PdfDocument> {
    let report = layout::layout(record, options)
        .with_context(|| format!("cannot render {}", record.id))?;
    let bytes = encode(&report)?;
    log::debug!(
        "rendered {} ({} pages, {} bytes)",
        record.id,
        report.pages.len(),
        bytes.len()
    );
    Ok(PdfDocument {
        filename: report_filename(&record.id),
        disposition,
        page_count: report.pages.len(),
        bytes,
    })
}

/// Encode every page of a layout into a PDF byte stream
pub fn encode(report: &ReportLayout) -> Result<Vec<u8>> {
    let geometry = report.page;
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in [FontFace::Regular, FontFace::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut kids = Vec::with_capacity(report.pages.len());
    for page in &report.pages {
        let content = Content {
            operations: page_operations(page, geometry.height),
        };
        let encoded = content
            .encode()
            .with_context(|| format!("failed to encode content of page {}", page.number))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::from(geometry.width as f32),
            Object::from(geometry.height as f32),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .context("failed to serialize PDF document")?;
    Ok(bytes)
}

fn page_operations(page: &Page, page_height: f64) -> Vec<Operation> {
    let mut ops = vec![Operation::new("w", vec![Object::from(LINE_WIDTH)])];
    for command in &page.commands {
        match command {
            DrawCommand::Rect(rect) => push_rect(&mut ops, rect, page_height),
            DrawCommand::Text(text) => push_text(&mut ops, text, page_height),
        }
    }
    ops
}

fn real(value: f64) -> Object {
    Object::from(value as f32)
}

fn color_op(operator: &str, color: Color) -> Operation {
    let (r, g, b) = color.unit_rgb();
    Operation::new(
        operator,
        vec![Object::from(r), Object::from(g), Object::from(b)],
    )
}

fn push_rect(ops: &mut Vec<Operation>, rect: &RectCommand, page_height: f64) {
    let paint = match (rect.fill, rect.stroke) {
        (Some(_), Some(_)) => "B",
        (Some(_), None) => "f",
        (None, Some(_)) => "S",
        (None, None) => return,
    };
    if let Some(fill) = rect.fill {
        ops.push(color_op("rg", fill));
    }
    if let Some(stroke) = rect.stroke {
        ops.push(color_op("RG", stroke));
    }
    ops.push(Operation::new(
        "re",
        vec![
            real(rect.x),
            real(page_height - rect.y - rect.height),
            real(rect.width),
            real(rect.height),
        ],
    ));
    ops.push(Operation::new(paint, vec![]));
}

fn push_text(ops: &mut Vec<Operation>, text: &TextCommand, page_height: f64) {
    let lines = text.lines();
    if lines.is_empty() {
        return;
    }

    let style = text.style;
    let ascent = style.face.ascender() * style.size / 1000.0;

    ops.push(color_op("rg", text.color));
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![
            Object::Name(style.face.resource_name().as_bytes().to_vec()),
            real(style.size),
        ],
    ));
    for (i, line) in lines.iter().enumerate() {
        let baseline = text.y + i as f64 * style.line_height() + ascent;
        ops.push(Operation::new(
            "Tm",
            vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                real(text.line_x(line)),
                real(page_height - baseline),
            ],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
}
