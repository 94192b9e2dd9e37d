//! Chart Viewer Widget
//! Central panel with the map and the coordinated bar chart side by side.
//! Hovering a county in either view highlights it in both.

use crate::charts::{ChartPlotter, ChoroplethData, MapLayout};
use crate::gui::MapView;
use egui::{RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;

pub struct ChartViewer {
    map_view: MapView,
    chart_size: [f32; 2],
    /// County under the pointer during the last frame.
    pub highlighted: Option<usize>,
}

impl ChartViewer {
    pub fn new(chart_size: [u32; 2]) -> Self {
        Self {
            map_view: MapView::new(),
            chart_size: [chart_size[0] as f32, chart_size[1] as f32],
            highlighted: None,
        }
    }

    pub fn clear(&mut self) {
        self.map_view.clear();
        self.highlighted = None;
    }

    pub fn show(&mut self, ui: &mut egui::Ui, view: Option<(&ChoroplethData, &MapLayout)>) {
        let Some((data, layout)) = view else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        let mut hovered_map = None;
        let mut hovered_bar = None;

        ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
            ui.horizontal_top(|ui| {
                ui.vertical(|ui| {
                    hovered_map = self.map_view.show(ui, data, layout, self.highlighted);
                });

                ui.add_space(CHART_SPACING);

                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(data.attribute().chart_title())
                            .size(18.0)
                            .strong(),
                    );
                    ui.add_space(8.0);
                    hovered_bar =
                        ChartPlotter::draw_bar_chart(ui, data, self.highlighted, self.chart_size);

                    ui.add_space(10.0);
                    let label = self.highlighted.and_then(|i| data.label_for(i));
                    match label {
                        Some(label) => ChartPlotter::draw_info_label(ui, &label),
                        None => {
                            ui.label(RichText::new("Hover a county or bar").weak());
                        }
                    }
                });
            });
        });

        let hovered = hovered_map.or(hovered_bar);
        if hovered != self.highlighted {
            self.highlighted = hovered;
            ui.ctx().request_repaint();
        }
    }
}
