//! PDF rendering of [`ReportContent`].
//!
//! Plain text layout on A4 with the builtin Helvetica fonts. Long type
//! breakdowns continue on additional pages.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use thiserror::Error;

use crate::report::ReportContent;

// ---

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const TOP: f32 = 270.0;
const BOTTOM: f32 = 20.0;
const LINE_HEIGHT: f32 = 8.0;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to render report: {0}")]
    Render(String),
}

impl From<printpdf::Error> for ReportError {
    fn from(e: printpdf::Error) -> Self {
        ReportError::Render(e.to_string())
    }
}

/// Cursor over the document that starts a new page when the current one is full.
struct PageWriter {
    // ---
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PageWriter {
    // ---
    fn new(title: &str) -> Result<Self, ReportError> {
        // ---
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: TOP,
        })
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        // ---
        if self.y < BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }

        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size, Mm(MARGIN_LEFT), Mm(self.y), font);
        self.y -= LINE_HEIGHT * (size / 12.0).max(1.0);
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        Ok(self.doc.save_to_bytes()?)
    }
}

/// Render report content into PDF bytes.
pub fn render_pdf(content: &ReportContent) -> Result<Vec<u8>, ReportError> {
    // ---
    let mut w = PageWriter::new(&format!("Equipment Report - Batch {}", content.batch_id))?;

    w.line("Chemical Equipment Report", 20.0, true);
    w.gap();
    w.line(&format!("Batch ID: {}", content.batch_id), 12.0, false);
    w.line(&format!("File: {}", content.filename), 12.0, false);
    w.line(
        &format!("Uploaded: {}", content.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC")),
        12.0,
        false,
    );
    w.gap();

    w.line("Summary", 14.0, true);
    w.line(&format!("Total Equipment: {}", content.total_count), 12.0, false);
    w.line(
        &format!("Average Flowrate: {:.2}", content.average_flowrate),
        12.0,
        false,
    );
    w.line(
        &format!("Average Pressure: {:.2}", content.average_pressure),
        12.0,
        false,
    );
    w.line(
        &format!("Average Temperature: {:.2}", content.average_temperature),
        12.0,
        false,
    );
    w.gap();

    w.line("Equipment Type Distribution", 14.0, true);
    if content.type_distribution.is_empty() {
        w.line("No equipment records.", 12.0, false);
    }
    for share in &content.type_distribution {
        w.line(
            &format!("{}: {} ({:.1}%)", share.label, share.count, share.percentage),
            12.0,
            false,
        );
    }

    w.finish()
}
