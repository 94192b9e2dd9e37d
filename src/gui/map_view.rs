//! Map View Widget
//! Choropleth raster shown as a texture, with pointer hit testing and the
//! blue outline of the highlighted county.

use crate::charts::{
    ChartPlotter, ChoroplethData, MapLayout, StaticChartRenderer, HIGHLIGHT_COLOR, HIGHLIGHT_WIDTH,
};
use crate::stats::Classification;
use egui::{pos2, vec2, Color32, ColorImage, Rect, Sense, Shape, Stroke, TextureHandle, TextureOptions};

#[derive(Default)]
pub struct MapView {
    texture: Option<TextureHandle>,
    /// Classification the texture was rasterized with.
    drawn_with: Option<Classification>,
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.texture = None;
        self.drawn_with = None;
    }

    fn refresh_texture(&mut self, ctx: &egui::Context, data: &ChoroplethData, layout: &MapLayout) {
        if self.drawn_with.as_ref() == Some(data.classification()) {
            return;
        }
        self.drawn_with = Some(data.classification().clone());

        match StaticChartRenderer::render_map_rgb(data, layout, None) {
            Ok(pixels) => {
                let size = [layout.width as usize, layout.height as usize];
                let image = ColorImage::from_rgb(size, &pixels);
                self.texture = Some(ctx.load_texture("choropleth", image, TextureOptions::LINEAR));
            }
            Err(e) => {
                log::error!("Map render failed: {e}");
                self.texture = None;
            }
        }
    }

    /// Draw the map. Returns the county under the pointer.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        data: &ChoroplethData,
        layout: &MapLayout,
        highlighted: Option<usize>,
    ) -> Option<usize> {
        self.refresh_texture(ui.ctx(), data, layout);

        let size = vec2(layout.width as f32, layout.height as f32);
        let (rect, response) = ui.allocate_exact_size(size, Sense::hover());

        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        if let Some(shape) = highlighted.and_then(|i| layout.counties.get(i)) {
            let stroke = Stroke::new(HIGHLIGHT_WIDTH, HIGHLIGHT_COLOR);
            for ring in shape.rings() {
                let points = ring
                    .iter()
                    .map(|[x, y]| rect.min + vec2(*x as f32, *y as f32))
                    .collect();
                ui.painter().add(Shape::closed_line(points, stroke));
            }
        }

        let hovered = response.hover_pos().and_then(|pos| {
            let local = pos - rect.min;
            layout.county_at(f64::from(local.x), f64::from(local.y))
        });

        if let Some(label) = hovered.and_then(|i| data.label_for(i)) {
            response.on_hover_ui_at_pointer(|ui| ChartPlotter::draw_info_label(ui, &label));
        }

        hovered
    }
}
