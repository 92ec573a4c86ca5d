// PDF report rendering
use crate::domain::report::{CHART_FALLBACK_TEXT, ReportDocument, fit_within};
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const CHART_BOX_HEIGHT: f32 = 100.0;
const VALUE_COLUMN: f32 = 110.0;
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

/// Top-down write position across pages.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PageCursor<'_> {
    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Contenido");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text(&mut self, text: &str, size: f32, bold: bool) {
        let line_height = size * 0.5;
        self.ensure(line_height);
        self.y -= line_height;
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), font);
    }

    fn row(&mut self, label: &str, value: &str) {
        self.ensure(6.0);
        self.y -= 6.0;
        self.layer
            .use_text(label, 10.0, Mm(MARGIN), Mm(self.y), &self.regular);
        self.layer
            .use_text(value, 10.0, Mm(VALUE_COLUMN), Mm(self.y), &self.bold);
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }
}

pub fn render_report(report: &ReportDocument) -> Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new(&report.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Contenido");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .context("Failed to load report font")?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .context("Failed to load report font")?;

    let mut cursor = PageCursor {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
        regular,
        bold,
    };

    cursor.text(&report.title, 18.0, true);
    if let Some(place) = &report.place_name {
        cursor.text(&format!("Lugar: {}", place), 11.0, false);
    }
    if let Some(period) = &report.period {
        cursor.text(&format!("Periodo: {}", period), 11.0, false);
    }
    cursor.gap(6.0);

    cursor.text("Métricas", 13.0, true);
    for (label, value) in report.metric_rows() {
        cursor.row(&label, &value);
    }

    let statistics = report.statistic_rows();
    if !statistics.is_empty() {
        cursor.gap(6.0);
        cursor.text("Estadísticas", 13.0, true);
        for (label, value) in statistics {
            cursor.row(&label, &value);
        }
    }

    cursor.gap(6.0);
    cursor.text("Gráfico", 13.0, true);
    match report.chart_png_base64.as_deref().map(decode_chart) {
        Some(Ok(chart)) => place_chart(&mut cursor, &chart),
        Some(Err(e)) => {
            tracing::warn!("Chart snapshot unusable, rendering without it: {:#}", e);
            cursor.text(CHART_FALLBACK_TEXT, 10.0, false);
        }
        None => cursor.text(CHART_FALLBACK_TEXT, 10.0, false),
    }
    drop(cursor);

    doc.save_to_bytes().context("Failed to write PDF")
}

fn decode_chart(encoded: &str) -> Result<DynamicImage> {
    // Accept data URLs as produced by canvas.toDataURL()
    let payload = encoded
        .split_once("base64,")
        .map(|(_, data)| data)
        .unwrap_or(encoded);
    let bytes = STANDARD
        .decode(payload.trim())
        .context("Chart image is not valid base64")?;
    let image = image_crate::load_from_memory(&bytes).context("Chart image is not decodable")?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

fn place_chart(cursor: &mut PageCursor<'_>, chart: &DynamicImage) {
    let (px_width, px_height) = chart.dimensions();
    let (width, height) = fit_within(
        CONTENT_WIDTH as f64,
        CHART_BOX_HEIGHT as f64,
        px_width as f64,
        px_height as f64,
    );
    let (width, height) = (width as f32, height as f32);

    let natural_width = px_width as f32 / IMAGE_DPI * MM_PER_INCH;
    let natural_height = px_height as f32 / IMAGE_DPI * MM_PER_INCH;

    cursor.ensure(height + 4.0);
    cursor.y -= height + 4.0;
    let x = MARGIN + (CONTENT_WIDTH - width) / 2.0;

    Image::from_dynamic_image(chart).add_to_layer(
        cursor.layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(cursor.y)),
            scale_x: Some(width / natural_width),
            scale_y: Some(height / natural_height),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::consumption::LossSummary;
    use image_crate::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn report(chart_png_base64: Option<String>) -> ReportDocument {
        ReportDocument {
            title: "Informe de pérdidas".to_string(),
            place_name: Some("Planta Norte".to_string()),
            period: Some("Semanas 3-5, 2024".to_string()),
            summary: LossSummary::compute(&[10.0, 10.0], &[1.0, 1.0]),
            statistics: None,
            chart_png_base64,
        }
    }

    fn png_base64(width: u32, height: u32) -> String {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        STANDARD.encode(bytes.into_inner())
    }

    #[test]
    fn test_renders_without_chart() {
        let pdf = render_report(&report(None)).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_renders_with_chart_and_data_url() {
        let data_url = format!("data:image/png;base64,{}", png_base64(40, 20));
        let pdf = render_report(&report(Some(data_url))).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_bad_chart_falls_back() {
        let pdf = render_report(&report(Some("%%%".to_string()))).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert!(decode_chart("%%%").is_err());
    }
}
