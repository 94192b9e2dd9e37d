//! Chart Plotter Module
//! Interactive bar chart and info label drawn with egui_plot.

use super::data::{BarDatum, ChoroplethData, InfoLabel};
use crate::stats::{Color, NO_DATA_COLOR};
use egui::{Color32, RichText, Stroke};
use egui_plot::{Bar, BarChart, Plot};

/// Outline of the hovered county, on the map and on its bar.
pub const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(0, 0, 255);
pub const HIGHLIGHT_WIDTH: f32 = 2.0;

const BAR_WIDTH: f64 = 0.8;

pub fn to_color32(color: Color) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

/// Creates the coordinated bar chart using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Index of the bar under a plot coordinate. Bars without a value still
    /// own their slot on the x axis.
    pub fn bar_at(bars: &[BarDatum], x: f64, y: f64) -> Option<usize> {
        let slot = x.round();
        if slot < 0.0 || (x - slot).abs() > BAR_WIDTH / 2.0 {
            return None;
        }
        let bar = bars.get(slot as usize)?;
        match bar.value {
            Some(v) if y >= 0.0 && y <= v => Some(bar.region),
            _ => None,
        }
    }

    /// Draw one bar per county, sorted by value. `highlighted` is a county
    /// index; returns the county whose bar is under the pointer.
    pub fn draw_bar_chart(
        ui: &mut egui::Ui,
        data: &ChoroplethData,
        highlighted: Option<usize>,
        size: [f32; 2],
    ) -> Option<usize> {
        let bars = data.bars();
        let names: Vec<String> = bars.iter().map(|b| b.name.clone()).collect();
        let attribute = data.attribute();

        let plot_bars: Vec<Bar> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let stroke = if Some(bar.region) == highlighted {
                    Stroke::new(HIGHLIGHT_WIDTH, HIGHLIGHT_COLOR)
                } else {
                    Stroke::NONE
                };
                Bar::new(i as f64, bar.value.unwrap_or(0.0))
                    .width(BAR_WIDTH)
                    .fill(to_color32(bar.color))
                    .stroke(stroke)
                    .name(&bar.name)
            })
            .collect();

        let response = Plot::new(format!("bars_{}", attribute.index()))
            .width(size[0])
            .height(size[1])
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .show_x(false)
            .show_y(false)
            .include_x(-0.5)
            .include_x(bars.len() as f64 - 0.5)
            .include_y(0.0)
            .include_y(data.y_max())
            .y_axis_label(attribute.column_name())
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                    return String::new();
                }
                names.get(idx as usize).cloned().unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(plot_bars).name(attribute.column_name()));
                plot_ui
                    .pointer_coordinate()
                    .and_then(|p| Self::bar_at(&bars, p.x, p.y))
            });

        if response.response.hovered() {
            response.inner
        } else {
            None
        }
    }

    /// The "value / attribute / county" label of the hovered county.
    pub fn draw_info_label(ui: &mut egui::Ui, label: &InfoLabel) {
        ui.vertical(|ui| {
            ui.label(RichText::new(&label.value).size(18.0).strong());
            ui.label(RichText::new(&label.attribute).size(12.0));
            ui.label(RichText::new(&label.name).size(12.0).color(Color32::GRAY));
        });
    }

    /// Color swatches with the value range of each class.
    pub fn draw_legend(ui: &mut egui::Ui, data: &ChoroplethData) {
        let no_data = (NO_DATA_COLOR, "No data".to_string());
        for (color, text) in data.legend().into_iter().chain(std::iter::once(no_data)) {
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
                ui.painter().rect_filled(rect, 3.0, to_color32(color));
                ui.label(RichText::new(text).size(12.0));
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars() -> Vec<BarDatum> {
        [(4, Some(90.0)), (0, Some(40.0)), (2, None)]
            .into_iter()
            .map(|(region, value)| BarDatum {
                region,
                name: format!("County {region}"),
                value,
                color: NO_DATA_COLOR,
            })
            .collect()
    }

    #[test]
    fn bar_hit_test_uses_slot_and_height() {
        let bars = bars();
        assert_eq!(ChartPlotter::bar_at(&bars, 0.1, 50.0), Some(4));
        assert_eq!(ChartPlotter::bar_at(&bars, 1.2, 39.0), Some(0));
        assert_eq!(ChartPlotter::bar_at(&bars, 1.2, 41.0), None);
        assert_eq!(ChartPlotter::bar_at(&bars, 0.5, 10.0), None);
        assert_eq!(ChartPlotter::bar_at(&bars, 2.0, 0.0), None);
        assert_eq!(ChartPlotter::bar_at(&bars, -1.0, 10.0), None);
        assert_eq!(ChartPlotter::bar_at(&bars, 7.0, 10.0), None);
    }

    #[test]
    fn converts_palette_colors() {
        assert_eq!(to_color32(NO_DATA_COLOR), Color32::from_rgb(0x80, 0x80, 0x80));
    }
}
