//! Paginated export of a [`ReviewDocument`].
//!
//! A [`PageRasterizer`] turns the review into one tall canvas. The canvas is
//! scaled to the usable page width and cut into usable-height slices, top to
//! bottom, so consecutive pages share an edge and never overlap.

use serde::Serialize;
use tracing::{debug, error};

use super::review::{ReviewDocument, ReviewLine};

pub const EXPORT_FILE_NAME: &str = "rental-application.pdf";

/// Fixed page geometry in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageLayout {
    /// US Letter portrait with 20pt margins.
    pub const LETTER: PageLayout = PageLayout {
        width: 612.0,
        height: 792.0,
        margin: 20.0,
    };

    pub fn usable_width(&self) -> f32 {
        self.width - self.margin * 2.0
    }

    pub fn usable_height(&self) -> f32 {
        self.height - self.margin * 2.0
    }

    /// Both usable dimensions are finite and positive.
    pub fn is_usable(&self) -> bool {
        let (width, height) = (self.usable_width(), self.usable_height());
        width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
    }

    /// Cuts `content_height` points of scaled content into page slices.
    /// Always yields at least one page; an unusable layout or content height
    /// collapses to a single page.
    pub fn slice(&self, content_height: f32) -> Vec<PageSlice> {
        let usable = self.usable_height();
        if !self.is_usable() || !content_height.is_finite() || content_height <= 0.0 {
            return vec![PageSlice {
                number: 1,
                offset: 0.0,
                height: if content_height.is_finite() {
                    content_height.max(0.0)
                } else {
                    0.0
                },
            }];
        }

        let count = (content_height / usable).ceil().max(1.0) as usize;
        (0..count)
            .map(|index| {
                let offset = index as f32 * usable;
                PageSlice {
                    number: index + 1,
                    offset,
                    height: (content_height - offset).clamp(0.0, usable),
                }
            })
            .collect()
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::LETTER
    }
}

/// Window into the scaled content shown on one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSlice {
    pub number: usize,
    pub offset: f32,
    pub height: f32,
}

/// One rendered row of the canvas, in canvas units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasRow {
    pub top: f32,
    pub height: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCanvas {
    pub width: f32,
    pub height: f32,
    pub rows: Vec<CanvasRow>,
}

/// Renders a review into a single tall canvas.
pub trait PageRasterizer {
    fn rasterize(&self, document: &ReviewDocument) -> Result<RenderedCanvas, ExportError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    #[error("review content is not available for export")]
    RenderTargetMissing,
    #[error("rasterizer produced an unusable canvas ({width}x{height})")]
    InvalidCanvas { width: f32, height: f32 },
    #[error("page layout leaves no usable area ({width}x{height}, margin {margin})")]
    InvalidLayout { width: f32, height: f32, margin: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedPage {
    pub number: usize,
    /// Offset of this page's slice within the scaled content, in points.
    pub offset: f32,
    pub height: f32,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub file_name: &'static str,
    pub layout: PageLayout,
    pub content_height: f32,
    pub pages: Vec<ExportedPage>,
}

impl ExportedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

pub fn export_review(
    document: Option<&ReviewDocument>,
    rasterizer: &dyn PageRasterizer,
) -> Result<ExportedDocument, ExportError> {
    export_with_layout(document, rasterizer, PageLayout::LETTER)
}

pub fn export_with_layout(
    document: Option<&ReviewDocument>,
    rasterizer: &dyn PageRasterizer,
    layout: PageLayout,
) -> Result<ExportedDocument, ExportError> {
    let Some(document) = document else {
        error!("export requested without a review document");
        return Err(ExportError::RenderTargetMissing);
    };

    if !layout.is_usable() {
        error!(?layout, "export requested with an unusable page layout");
        return Err(ExportError::InvalidLayout {
            width: layout.width,
            height: layout.height,
            margin: layout.margin,
        });
    }

    let canvas = rasterizer.rasterize(document)?;
    let usable = canvas.width.is_finite()
        && canvas.height.is_finite()
        && canvas.width > 0.0
        && canvas.height >= 0.0;
    if !usable {
        error!(width = canvas.width, height = canvas.height, "rasterizer returned an unusable canvas");
        return Err(ExportError::InvalidCanvas {
            width: canvas.width,
            height: canvas.height,
        });
    }

    let scale = layout.usable_width() / canvas.width;
    let content_height = canvas.height * scale;

    let pages: Vec<ExportedPage> = layout
        .slice(content_height)
        .into_iter()
        .map(|slice| {
            let end = slice.offset + layout.usable_height();
            let lines = canvas
                .rows
                .iter()
                .filter(|row| {
                    let top = row.top * scale;
                    top >= slice.offset && top < end
                })
                .map(|row| row.text.clone())
                .collect();
            ExportedPage {
                number: slice.number,
                offset: slice.offset,
                height: slice.height,
                lines,
            }
        })
        .collect();

    debug!(pages = pages.len(), content_height, "review exported");

    Ok(ExportedDocument {
        file_name: EXPORT_FILE_NAME,
        layout,
        content_height,
        pages,
    })
}

/// Lays the review out as fixed-height text rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRasterizer {
    pub canvas_width: f32,
    /// Height of one item row; other rows are multiples of it.
    pub line_height: f32,
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self {
            canvas_width: 1144.0,
            line_height: 28.0,
        }
    }
}

impl TextRasterizer {
    fn row_height(&self, line: &ReviewLine) -> f32 {
        let factor = match line {
            ReviewLine::Title(_) => 2.0,
            ReviewLine::Heading(_) => 1.5,
            ReviewLine::Caption(_) | ReviewLine::Section(_) | ReviewLine::Item { .. } => 1.0,
            ReviewLine::Separator => 0.5,
            ReviewLine::Signature { .. } => 4.0,
        };
        self.line_height * factor
    }
}

fn render_line(line: &ReviewLine) -> String {
    match line {
        ReviewLine::Title(text) => text.to_uppercase(),
        ReviewLine::Heading(text) => format!("== {text} =="),
        ReviewLine::Caption(text) => text.clone(),
        ReviewLine::Section(text) => format!("-- {text}"),
        ReviewLine::Item { label, value } => format!("{label}: {value}"),
        ReviewLine::Separator => String::new(),
        ReviewLine::Signature { name, caption } => format!("________________ {name} ({caption})"),
    }
}

impl PageRasterizer for TextRasterizer {
    fn rasterize(&self, document: &ReviewDocument) -> Result<RenderedCanvas, ExportError> {
        let mut top = 0.0;
        let rows: Vec<CanvasRow> = document
            .lines()
            .iter()
            .map(|line| {
                let height = self.row_height(line);
                let row = CanvasRow {
                    top,
                    height,
                    text: render_line(line),
                };
                top += height;
                row
            })
            .collect();

        Ok(RenderedCanvas {
            width: self.canvas_width,
            height: top,
            rows,
        })
    }
}
