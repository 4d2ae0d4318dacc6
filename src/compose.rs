//! Combining visuals: overlays and layouts
//!
//! An [`Overlay`] stacks visuals on one shared set of axes, later layers
//! drawn on top. A [`Layout`] arranges panes side by side in a grid with a
//! configurable column count. Both are display-time constructs with no
//! lifecycle beyond the session, mirroring the `*` and `+` operators of the
//! source ecosystem: `a * b` overlays, `a + b` lays out.
//!
//! Overlaying visuals whose coordinate-reference tags differ is not an
//! error here: the display layer resolves projections, so composition emits
//! a warning and proceeds. [`Overlay::check_axes`] offers the strict form.

use crate::errors::{GridViewsError, Result};
use crate::visual::raster::{rasterize, Color, RenderOptions, RgbaBuffer};
use crate::visual::{Extent, VisualObject};
use std::ops::{Add, Mul};

/// Visuals stacked on one shared set of axes, back to front
#[derive(Debug, Clone)]
pub struct Overlay {
    layers: Vec<VisualObject>,
}

impl Overlay {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Stack another visual on top.
    ///
    /// Differing coordinate-reference tags produce a warning, not an error;
    /// resolution is the display layer's concern.
    pub fn push(&mut self, visual: VisualObject) {
        if let (Some(first), Some(added)) = (
            self.layers.first().and_then(|l| l.crs),
            visual.crs,
        ) {
            if first != added {
                eprintln!(
                    "Warning: overlaying visuals with differing coordinate systems ('{}' vs '{}')",
                    first.name(),
                    added.name()
                );
            }
        }
        self.layers.push(visual);
    }

    /// Strict variant of the coordinate check performed on `push`.
    ///
    /// # Errors
    ///
    /// Returns `MismatchedAxes` if any two layers carry differing tags.
    pub fn check_axes(&self) -> Result<()> {
        let mut tagged = self.layers.iter().filter_map(|l| l.crs);
        if let Some(first) = tagged.next() {
            for other in tagged {
                if other != first {
                    return Err(GridViewsError::MismatchedAxes {
                        left: first.name(),
                        right: other.name(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn layers(&self) -> &[VisualObject] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Union of the layer extents
    pub fn extent(&self) -> Option<Extent> {
        let mut layers = self.layers.iter();
        let first = layers.next()?.extent;
        Some(layers.fold(first, |acc, layer| {
            let e = layer.extent;
            Extent {
                x0: acc.x0.min(e.x0),
                y0: acc.y0.min(e.y0),
                x1: acc.x1.max(e.x1),
                y1: acc.y1.max(e.y1),
            }
        }))
    }

    /// Union of the layer value ranges
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let mut result: Option<(f32, f32)> = None;
        for layer in &self.layers {
            if let Some((lo, hi)) = layer.value_range {
                result = Some(match result {
                    Some((rlo, rhi)) => (rlo.min(lo), rhi.max(hi)),
                    None => (lo, hi),
                });
            }
        }
        result
    }

    /// Rasterize every layer and composite back-to-front into one buffer
    pub fn rasterize(&self, options: &RenderOptions) -> Result<RgbaBuffer> {
        let mut layers = self.layers.iter();
        let first = layers
            .next()
            .ok_or_else(|| GridViewsError::Generic("Cannot rasterize an empty overlay".into()))?;
        let mut buffer = rasterize(first, options)?;
        for layer in layers {
            let top = rasterize(layer, options)?;
            buffer.blend_over(&top)?;
        }
        Ok(buffer)
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new()
    }
}

impl From<VisualObject> for Overlay {
    fn from(visual: VisualObject) -> Self {
        let mut overlay = Overlay::new();
        overlay.push(visual);
        overlay
    }
}

/// Panes arranged side by side in a grid
#[derive(Debug, Clone)]
pub struct Layout {
    panes: Vec<Overlay>,
    cols: usize,
}

impl Layout {
    pub fn new() -> Self {
        Self {
            panes: Vec::new(),
            cols: 2,
        }
    }

    /// Set the number of grid columns
    pub fn with_cols(mut self, cols: usize) -> Self {
        self.cols = cols.max(1);
        self
    }

    pub fn push<P: Into<Overlay>>(&mut self, pane: P) {
        self.panes.push(pane.into());
    }

    pub fn panes(&self) -> &[Overlay] {
        &self.panes
    }

    pub fn len(&self) -> usize {
        self.panes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Grid rows needed for the current pane count
    pub fn rows(&self) -> usize {
        if self.panes.is_empty() {
            0
        } else {
            (self.panes.len() + self.cols - 1) / self.cols
        }
    }

    /// Rasterize every pane at the per-pane size and tile them into a sheet
    pub fn rasterize(&self, options: &RenderOptions) -> Result<RgbaBuffer> {
        if self.panes.is_empty() {
            return Err(GridViewsError::Generic(
                "Cannot rasterize an empty layout".into(),
            ));
        }

        let tiles: Vec<RgbaBuffer> = self
            .panes
            .iter()
            .map(|pane| pane.rasterize(options))
            .collect::<Result<_>>()?;

        let tile_w = tiles[0].width;
        let tile_h = tiles[0].height;
        let sheet_w = tile_w * self.cols.min(self.panes.len());
        let sheet_h = tile_h * self.rows();

        let mut sheet = RgbaBuffer::filled(sheet_w, sheet_h, Color::transparent());
        for (i, tile) in tiles.iter().enumerate() {
            let ox = (i % self.cols) * tile_w;
            let oy = (i / self.cols) * tile_h;
            for y in 0..tile.height {
                for x in 0..tile.width {
                    let idx = (y * tile.width + x) * 4;
                    let px = &tile.pixels[idx..idx + 4];
                    sheet.set(ox + x, oy + y, Color::new(px[0], px[1], px[2], px[3]));
                }
            }
        }
        Ok(sheet)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl From<VisualObject> for Layout {
    fn from(visual: VisualObject) -> Self {
        let mut layout = Layout::new();
        layout.push(visual);
        layout
    }
}

impl From<Overlay> for Layout {
    fn from(overlay: Overlay) -> Self {
        let mut layout = Layout::new();
        layout.push(overlay);
        layout
    }
}

// `a * b` overlays; `a + b` lays out.

impl Mul for VisualObject {
    type Output = Overlay;

    fn mul(self, rhs: VisualObject) -> Overlay {
        let mut overlay = Overlay::from(self);
        overlay.push(rhs);
        overlay
    }
}

impl Mul<VisualObject> for Overlay {
    type Output = Overlay;

    fn mul(mut self, rhs: VisualObject) -> Overlay {
        self.push(rhs);
        self
    }
}

impl Mul<Overlay> for Overlay {
    type Output = Overlay;

    fn mul(mut self, rhs: Overlay) -> Overlay {
        for layer in rhs.layers {
            self.push(layer);
        }
        self
    }
}

impl Add for VisualObject {
    type Output = Layout;

    fn add(self, rhs: VisualObject) -> Layout {
        let mut layout = Layout::from(self);
        layout.push(rhs);
        layout
    }
}

impl Add<VisualObject> for Layout {
    type Output = Layout;

    fn add(mut self, rhs: VisualObject) -> Layout {
        self.push(rhs);
        self
    }
}

impl Add<Overlay> for Layout {
    type Output = Layout;

    fn add(mut self, rhs: Overlay) -> Layout {
        self.push(rhs);
        self
    }
}

impl Add for Overlay {
    type Output = Layout;

    fn add(self, rhs: Overlay) -> Layout {
        let mut layout = Layout::from(self);
        layout.push(rhs);
        layout
    }
}

impl Add<Layout> for Layout {
    type Output = Layout;

    fn add(mut self, rhs: Layout) -> Layout {
        for pane in rhs.panes {
            self.panes.push(pane);
        }
        self
    }
}
