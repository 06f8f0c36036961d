//! Export boundaries: canvas to PNG, shared text to a printable document.

use crate::surface::Surface;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PNG encoding error: {0}")]
    Encoding(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode the surface's pixel buffer as a PNG.
pub fn encode_png(surface: &Surface) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, surface.width(), surface.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Encoding(e.to_string()))?;
        writer
            .write_image_data(surface.pixels())
            .map_err(|e| ExportError::Encoding(e.to_string()))?;
    }
    Ok(out)
}

/// Write the surface as a PNG file.
pub fn write_png(surface: &Surface, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = png::Encoder::new(&mut writer, surface.width(), surface.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut png_writer = encoder
        .write_header()
        .map_err(|e| ExportError::Encoding(e.to_string()))?;
    png_writer
        .write_image_data(surface.pixels())
        .map_err(|e| ExportError::Encoding(e.to_string()))?;
    Ok(())
}

/// Build the printable HTML document for the shared text.
///
/// The body preserves whitespace and drops its padding under print
/// media; opening the document and invoking the platform print dialog is
/// the caller's concern.
pub fn print_document(text: &str) -> String {
    format!(
        r#"<html>
  <head>
    <title>Quillboard - Print</title>
    <style>
      body {{
        line-height: 1.5;
        padding: 2rem;
        white-space: pre-wrap;
      }}
      @media print {{
        body {{
          padding: 0;
        }}
      }}
    </style>
  </head>
  <body>{}</body>
</html>
"#,
        escape_html(text)
    )
}

/// Write the printable document to a file.
pub fn write_print_document(text: &str, path: &Path) -> Result<(), ExportError> {
    std::fs::write(path, print_document(text))?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::StrokeSegment;
    use kurbo::Point;

    #[test]
    fn test_png_roundtrip() {
        let mut surface = Surface::new(8, 8, 1.0);
        surface
            .draw_segment(&StrokeSegment {
                from: Point::new(1.0, 1.0),
                to: Point::new(6.0, 6.0),
                color: "#336699".to_string(),
                width: 2.0,
            })
            .unwrap();

        let bytes = encode_png(&surface).unwrap();
        let decoder = png::Decoder::new(&bytes[..]);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();

        assert_eq!(info.width, surface.width());
        assert_eq!(info.height, surface.height());
        assert_eq!(&buf[..info.buffer_size()], surface.pixels());
    }

    #[test]
    fn test_write_png_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.png");
        let surface = Surface::new(4, 4, 1.0);

        write_png(&surface, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_print_document_wraps_text() {
        let doc = print_document("line one\nline two");
        assert!(doc.contains("line one\nline two"));
        assert!(doc.contains("white-space: pre-wrap"));
        assert!(doc.contains("@media print"));
    }

    #[test]
    fn test_print_document_escapes_markup() {
        let doc = print_document("<script>alert(1)</script> & more");
        assert!(!doc.contains("<script>"));
        assert!(doc.contains("&lt;script&gt;"));
        assert!(doc.contains("&amp; more"));
    }
}
