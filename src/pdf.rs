use printpdf::{
    image_crate::codecs::png::PngDecoder, BuiltinFont, Image, ImageTransform, Mm, PdfDocument,
};

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use crate::{error::PipelineError, insights::Insights};

// A4 portrait, with a fixed side margin.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 11.0;
const LINE_STEP: f32 = 8.0;

/// The dpi plotters encodes PNG output at.
const IMAGE_DPI: f32 = 300.0;

/// Composes the one-page PDF report at `path`: a centered title, the insight
/// summary as a "Key Insights" section, and the chart image scaled to the
/// page width minus the margins. Overwrites any existing file at `path`.
///
/// # Errors
///
/// Returns [`PipelineError::CompositionFailure`] when the chart image is
/// missing or any PDF or write error occurs.
pub fn compose_report(
    path: impl AsRef<Path>,
    insights: &Insights,
    chart_path: impl AsRef<Path>,
) -> Result<(), PipelineError> {
    let chart_path = chart_path.as_ref();
    if !chart_path.is_file() {
        return Err(PipelineError::CompositionFailure(format!(
            "chart image not found: {}",
            chart_path.display()
        )));
    }
    compose(path.as_ref(), insights, chart_path)
        .map_err(|e| PipelineError::CompositionFailure(e.to_string()))
}

fn compose(
    path: &Path,
    insights: &Insights,
    chart_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let (doc, page, layer) = PdfDocument::new(
        "Sales Analysis Report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    let title = "Sales Analysis Report";
    layer.use_text(title, TITLE_SIZE, Mm(centered_x(title, TITLE_SIZE)), Mm(272.0), &bold);

    let mut cursor = 252.0;
    layer.use_text("Key Insights:", HEADING_SIZE, Mm(MARGIN), Mm(cursor), &bold);
    cursor -= LINE_STEP;
    for line in insights.summary_lines() {
        let indent = if line.starts_with(' ') { MARGIN + 8.0 } else { MARGIN };
        layer.use_text(line.trim_start(), BODY_SIZE, Mm(indent), Mm(cursor), &regular);
        cursor -= LINE_STEP;
    }

    cursor -= 6.0;
    layer.use_text("Chart:", HEADING_SIZE, Mm(MARGIN), Mm(cursor), &bold);
    cursor -= 4.0;

    let image = Image::try_from(PngDecoder::new(BufReader::new(File::open(chart_path)?))?)?;
    let natural_width = px_to_mm(image.image.width.0);
    let natural_height = px_to_mm(image.image.height.0);
    // Fit the page width minus the margins, shrinking further if the
    // remaining vertical space is tighter.
    let scale = ((PAGE_WIDTH - 2.0 * MARGIN) / natural_width)
        .min((cursor - MARGIN) / natural_height);
    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(MARGIN)),
            translate_y: Some(Mm(cursor - natural_height * scale)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );

    doc.save(&mut BufWriter::new(File::create(path)?))?;
    Ok(())
}

fn px_to_mm(px: usize) -> f32 {
    px as f32 * 25.4 / IMAGE_DPI
}

/// Approximate centering for builtin Helvetica (average glyph width of half
/// the point size, 0.3528 mm per point).
fn centered_x(text: &str, font_size: f32) -> f32 {
    let text_width = text.len() as f32 * font_size * 0.5 * 0.3528;
    ((PAGE_WIDTH - text_width) / 2.0).max(MARGIN)
}
