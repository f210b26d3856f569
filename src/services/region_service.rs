//! Rectangle selection over a rendered preview, and cropping that rectangle
//! out of the source image for a scoped OCR pass.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::models::selection::{PixelRect, Point, RenderedSize, SelectionRegion};
use crate::services::ocr_service::{ImageInput, OcrEngine, ProgressReporter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionState {
    Idle,
    Selecting {
        anchor: Option<Point>,
        current: Option<Point>,
    },
    SelectionComplete {
        region: SelectionRegion,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionSelector {
    state: SelectionState,
    min_size: f64,
}

impl RegionSelector {
    pub fn new(min_size: f64) -> Self {
        Self {
            state: SelectionState::Idle,
            min_size,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectionState::Selecting { .. })
    }

    /// Starts a fresh selection, or cancels the one in progress.
    pub fn toggle(&mut self) {
        self.state = if self.is_selecting() {
            SelectionState::Idle
        } else {
            SelectionState::Selecting {
                anchor: None,
                current: None,
            }
        };
    }

    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
    }

    pub fn pointer_down(&mut self, at: Point) {
        if let SelectionState::Selecting { anchor, current } = &mut self.state {
            *anchor = Some(at);
            *current = Some(at);
        }
    }

    pub fn pointer_move(&mut self, at: Point) {
        if let SelectionState::Selecting {
            anchor: Some(_),
            current,
        } = &mut self.state
        {
            *current = Some(at);
        }
    }

    /// Finalizes the drag. Too-small rectangles are dropped back to `Idle`.
    pub fn pointer_up(&mut self) -> &SelectionState {
        let Some(region) = self.live_region() else {
            return &self.state;
        };
        self.state = if region.width < self.min_size || region.height < self.min_size {
            tracing::debug!(?region, "selection below minimum size, discarded");
            SelectionState::Idle
        } else {
            SelectionState::SelectionComplete { region }
        };
        &self.state
    }

    /// The rectangle being dragged, while selecting.
    pub fn live_region(&self) -> Option<SelectionRegion> {
        match self.state {
            SelectionState::Selecting {
                anchor: Some(anchor),
                current: Some(current),
            } => Some(SelectionRegion::from_corners(anchor, current)),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<SelectionRegion> {
        match self.state {
            SelectionState::SelectionComplete { region } => Some(region),
            _ => None,
        }
    }
}

/// Maps a rendered-space rectangle onto the native pixel grid, clamped to the
/// image. `None` when nothing of the image is covered.
pub fn to_native_rect(
    region: &SelectionRegion,
    rendered: RenderedSize,
    native_width: u32,
    native_height: u32,
) -> Option<PixelRect> {
    if rendered.width <= 0.0 || rendered.height <= 0.0 {
        return None;
    }
    let scale_x = native_width as f64 / rendered.width;
    let scale_y = native_height as f64 / rendered.height;

    let x0 = (region.x * scale_x).floor().clamp(0.0, native_width as f64);
    let y0 = (region.y * scale_y).floor().clamp(0.0, native_height as f64);
    let x1 = ((region.x + region.width) * scale_x)
        .ceil()
        .clamp(0.0, native_width as f64);
    let y1 = ((region.y + region.height) * scale_y)
        .ceil()
        .clamp(0.0, native_height as f64);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Crops `region` out of the encoded source image and re-encodes it as PNG.
pub fn crop_to_png(
    source: &[u8],
    region: &SelectionRegion,
    rendered: RenderedSize,
) -> Result<(Vec<u8>, PixelRect), ExtractionError> {
    let decoded = image::load_from_memory(source).map_err(ExtractionError::Decode)?;
    let rect = to_native_rect(region, rendered, decoded.width(), decoded.height())
        .ok_or(ExtractionError::EmptyRegion)?;
    let cropped = decoded.crop_imm(rect.x, rect.y, rect.width, rect.height);

    let mut png = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(ExtractionError::Encode)?;
    Ok((png, rect))
}

/// Runs OCR on the cropped region only.
pub async fn extract_region_text(
    engine: &dyn OcrEngine,
    source: &[u8],
    region: &SelectionRegion,
    rendered: RenderedSize,
    language: &str,
) -> Result<String, ExtractionError> {
    let (png, rect) = crop_to_png(source, region, rendered)?;
    tracing::info!(
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        "extracting text from region"
    );
    let text = engine
        .recognize(
            ImageInput::png(png),
            language,
            ProgressReporter::logging("region"),
        )
        .await?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ocr_service::mock::MockOcrEngine;
    use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

    fn selecting() -> RegionSelector {
        let mut selector = RegionSelector::new(10.0);
        selector.toggle();
        selector
    }

    fn drag(selector: &mut RegionSelector, from: (f64, f64), to: (f64, f64)) {
        selector.pointer_down(Point::new(from.0, from.1));
        selector.pointer_move(Point::new(to.0, to.1));
        selector.pointer_up();
    }

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn pointer_events_ignored_while_idle() {
        let mut selector = RegionSelector::new(10.0);
        drag(&mut selector, (0.0, 0.0), (100.0, 100.0));
        assert_eq!(selector.state(), &SelectionState::Idle);
    }

    #[test]
    fn drag_completes_selection_in_any_direction() {
        let mut selector = selecting();
        drag(&mut selector, (120.0, 90.0), (20.0, 40.0));
        assert_eq!(
            selector.selection(),
            Some(SelectionRegion {
                x: 20.0,
                y: 40.0,
                width: 100.0,
                height: 50.0
            })
        );
    }

    #[test]
    fn small_selection_returns_to_idle() {
        let mut selector = selecting();
        drag(&mut selector, (0.0, 0.0), (200.0, 9.5));
        assert_eq!(selector.state(), &SelectionState::Idle);

        let mut selector = selecting();
        drag(&mut selector, (0.0, 0.0), (9.0, 200.0));
        assert_eq!(selector.state(), &SelectionState::Idle);

        let mut selector = selecting();
        drag(&mut selector, (0.0, 0.0), (10.0, 10.0));
        assert!(selector.selection().is_some());
    }

    #[test]
    fn live_region_tracks_pointer() {
        let mut selector = selecting();
        assert!(selector.live_region().is_none());
        selector.pointer_down(Point::new(5.0, 5.0));
        selector.pointer_move(Point::new(25.0, 45.0));
        let live = selector.live_region().unwrap();
        assert_eq!((live.width, live.height), (20.0, 40.0));
    }

    #[test]
    fn pointer_up_without_anchor_keeps_selecting() {
        let mut selector = selecting();
        selector.pointer_up();
        assert!(selector.is_selecting());
    }

    #[test]
    fn toggle_cancels_and_restarts() {
        let mut selector = selecting();
        selector.toggle();
        assert_eq!(selector.state(), &SelectionState::Idle);

        let mut selector = selecting();
        drag(&mut selector, (0.0, 0.0), (50.0, 50.0));
        selector.toggle();
        assert!(selector.is_selecting());
        assert!(selector.selection().is_none());
    }

    #[test]
    fn native_rect_scales_with_render_size() {
        let region = SelectionRegion {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 50.0,
        };
        let rendered = RenderedSize {
            width: 400.0,
            height: 300.0,
        };
        assert_eq!(
            to_native_rect(&region, rendered, 800, 600),
            Some(PixelRect {
                x: 20,
                y: 40,
                width: 200,
                height: 100
            })
        );
        assert_eq!(
            to_native_rect(&region, rendered, 400, 300),
            Some(PixelRect {
                x: 10,
                y: 20,
                width: 100,
                height: 50
            })
        );
    }

    #[test]
    fn native_rect_is_clamped_to_image() {
        let rendered = RenderedSize {
            width: 100.0,
            height: 100.0,
        };
        let overhang = SelectionRegion {
            x: 80.0,
            y: 90.0,
            width: 50.0,
            height: 50.0,
        };
        assert_eq!(
            to_native_rect(&overhang, rendered, 100, 100),
            Some(PixelRect {
                x: 80,
                y: 90,
                width: 20,
                height: 10
            })
        );
        let outside = SelectionRegion {
            x: 150.0,
            y: 0.0,
            width: 20.0,
            height: 20.0,
        };
        assert_eq!(to_native_rect(&outside, rendered, 100, 100), None);
        let zero = RenderedSize {
            width: 0.0,
            height: 100.0,
        };
        assert_eq!(to_native_rect(&outside, zero, 100, 100), None);
    }

    #[test]
    fn crop_returns_only_the_selected_pixels() {
        let source = png_fixture(200, 100);
        let region = SelectionRegion {
            x: 60.0,
            y: 10.0,
            width: 20.0,
            height: 15.0,
        };
        let rendered = RenderedSize {
            width: 100.0,
            height: 50.0,
        };
        let (png, rect) = crop_to_png(&source, &region, rendered).unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 120,
                y: 20,
                width: 40,
                height: 30
            }
        );
        let cropped = image::load_from_memory(&png).unwrap();
        assert_eq!(cropped.dimensions(), (40, 30));
        assert_eq!(cropped.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn crop_of_garbage_is_decode_error() {
        let region = SelectionRegion {
            x: 0.0,
            y: 0.0,
            width: 20.0,
            height: 20.0,
        };
        let rendered = RenderedSize {
            width: 20.0,
            height: 20.0,
        };
        let err = crop_to_png(b"not an image", &region, rendered).unwrap_err();
        assert!(matches!(err, ExtractionError::Decode(_)));
    }

    #[tokio::test]
    async fn extraction_sends_only_the_crop_to_the_engine() {
        let engine = MockOcrEngine::new("Total: $99.00");
        let source = png_fixture(64, 64);
        let region = SelectionRegion {
            x: 0.0,
            y: 0.0,
            width: 16.0,
            height: 16.0,
        };
        let rendered = RenderedSize {
            width: 32.0,
            height: 32.0,
        };
        let text = extract_region_text(&engine, &source, &region, rendered, "eng")
            .await
            .unwrap();
        assert_eq!(text, "Total: $99.00");

        let inputs = engine.inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].mime_type, "image/png");
        let sent = image::load_from_memory(&inputs[0].bytes).unwrap();
        assert_eq!(sent.dimensions(), (32, 32));
    }
}
