//! Static Chart Renderer
//! Draws the choropleth map and the bar chart into RGB buffers with plotters.
//!
//! Layout of the exported report:
//! 1. Left: the map, background layer first, counties on top, legend in the
//!    lower right corner
//! 2. Right: bar chart of the expressed attribute, highest value first

use super::data::ChoroplethData;
use super::map_layout::MapLayout;
use crate::stats::{Color, NO_DATA_COLOR};
use image::{imageops, Rgb, RgbImage};
use plotters::prelude::*;
use plotters::style::Color as _;
use std::path::Path;
use thiserror::Error;

const BACKGROUND_FILL: RGBColor = RGBColor(230, 230, 230);
const OUTLINE: RGBColor = RGBColor(60, 60, 60);
const BACKGROUND_OUTLINE: RGBColor = RGBColor(170, 170, 170);
const HIGHLIGHT: RGBColor = RGBColor(0, 0, 255);
const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Pixel buffer does not match {0}x{1}")]
    BufferSize(u32, u32),
}

fn drawing_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

fn rgb(color: Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn pixels(ring: &[[f64; 2]]) -> Vec<(i32, i32)> {
    ring.iter()
        .map(|[x, y]| (x.round() as i32, y.round() as i32))
        .collect()
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Rasterize the map. `highlight` outlines one county in blue.
    pub fn render_map_rgb(
        data: &ChoroplethData,
        layout: &MapLayout,
        highlight: Option<usize>,
    ) -> Result<Vec<u8>, RenderError> {
        let (width, height) = (layout.width, layout.height);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(drawing_error)?;

            for shape in &layout.background {
                for ring in shape.exteriors() {
                    root.draw(&Polygon::new(pixels(&ring), BACKGROUND_FILL.filled()))
                        .map_err(drawing_error)?;
                }
                for ring in shape.rings() {
                    root.draw(&PathElement::new(pixels(&ring), BACKGROUND_OUTLINE))
                        .map_err(drawing_error)?;
                }
            }

            for (i, shape) in layout.counties.iter().enumerate() {
                let fill = rgb(data.fill_for(i));
                for ring in shape.exteriors() {
                    root.draw(&Polygon::new(pixels(&ring), fill.filled()))
                        .map_err(drawing_error)?;
                }
                for ring in shape.rings() {
                    root.draw(&PathElement::new(pixels(&ring), OUTLINE))
                        .map_err(drawing_error)?;
                }
            }

            if let Some(shape) = highlight.and_then(|i| layout.counties.get(i)) {
                for ring in shape.rings() {
                    root.draw(&PathElement::new(pixels(&ring), HIGHLIGHT.stroke_width(2)))
                        .map_err(drawing_error)?;
                }
            }

            root.present().map_err(drawing_error)?;
        }
        Ok(buffer)
    }

    /// Rasterize the coordinated bar chart.
    pub fn render_chart_rgb(
        data: &ChoroplethData,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let bars = data.bars();
        let names: Vec<String> = bars.iter().map(|b| b.name.clone()).collect();
        let attribute = data.attribute();

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(drawing_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(attribute.chart_title(), (FONT, 18))
                .margin(10)
                .x_label_area_size(110)
                .y_label_area_size(70)
                .build_cartesian_2d((0..bars.len().max(1)).into_segmented(), 0.0..data.y_max())
                .map_err(drawing_error)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(bars.len())
                .x_label_formatter(&|v: &SegmentValue<usize>| match v {
                    SegmentValue::CenterOf(i) => names.get(*i).cloned().unwrap_or_default(),
                    _ => String::new(),
                })
                .x_label_style((FONT, 11).into_font().transform(FontTransform::Rotate90))
                .y_label_formatter(&|v: &f64| {
                    if attribute.is_earnings() {
                        format!("${v:.0}")
                    } else {
                        format!("{v:.0}")
                    }
                })
                .y_desc(attribute.column_name())
                .draw()
                .map_err(drawing_error)?;

            chart
                .draw_series(bars.iter().enumerate().filter_map(|(i, bar)| {
                    let value = bar.value?;
                    let mut rect = Rectangle::new(
                        [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), value)],
                        rgb(bar.color).filled(),
                    );
                    rect.set_margin(0, 0, 2, 2);
                    Some(rect)
                }))
                .map_err(drawing_error)?;

            root.present().map_err(drawing_error)?;
        }
        Ok(buffer)
    }

    /// Map and bar chart side by side, saved as PNG.
    pub fn render_report_png(
        data: &ChoroplethData,
        layout: &MapLayout,
        chart_size: [u32; 2],
        path: &Path,
    ) -> Result<(), RenderError> {
        let mut map_buffer = Self::render_map_rgb(data, layout, None)?;
        Self::draw_legend(data, &mut map_buffer, layout.width, layout.height)?;
        let map = RgbImage::from_raw(layout.width, layout.height, map_buffer)
            .ok_or(RenderError::BufferSize(layout.width, layout.height))?;

        let [chart_w, chart_h] = chart_size;
        let chart = RgbImage::from_raw(chart_w, chart_h, Self::render_chart_rgb(data, chart_w, chart_h)?)
            .ok_or(RenderError::BufferSize(chart_w, chart_h))?;

        let mut report = RgbImage::from_pixel(
            layout.width + chart_w,
            layout.height.max(chart_h),
            Rgb([255, 255, 255]),
        );
        imageops::replace(&mut report, &map, 0, 0);
        imageops::replace(&mut report, &chart, i64::from(layout.width), 0);
        report.save(path)?;

        log::info!("Saved {} report to {}", data.attribute(), path.display());
        Ok(())
    }

    fn draw_legend(
        data: &ChoroplethData,
        buffer: &mut [u8],
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let mut rows = data.legend();
        if rows.is_empty() {
            return Ok(());
        }
        rows.push((NO_DATA_COLOR, "No data".to_string()));
        let root = BitMapBackend::with_buffer(buffer, (width, height)).into_drawing_area();
        let row_h = 18;
        let x = width as i32 - 150;
        let mut y = height as i32 - 10 - row_h * rows.len() as i32;
        for (color, text) in rows {
            root.draw(&Rectangle::new([(x, y), (x + 14, y + 14)], rgb(color).filled()))
                .map_err(drawing_error)?;
            root.draw(&Text::new(text, (x + 20, y), (FONT, 13).into_font()))
                .map_err(drawing_error)?;
            y += row_h;
        }
        root.present().map_err(drawing_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::projection::ProjectionConfig;
    use crate::data::{Attribute, Region};
    use crate::stats::ClassRule;
    use geo::{LineString, MultiPolygon, Polygon};

    fn square(id: &str, lon: f64, lat: f64) -> Region {
        let ring = LineString::from(vec![
            (lon, lat),
            (lon + 1.0, lat),
            (lon + 1.0, lat + 1.0),
            (lon, lat + 1.0),
            (lon, lat),
        ]);
        Region::new(id, None, MultiPolygon::new(vec![Polygon::new(ring, vec![])]))
    }

    #[test]
    fn map_raster_fills_counties_with_class_colors() {
        let mut with_value = square("1", -107.0, 34.0);
        with_value
            .attributes
            .set(Attribute::HighschoolGraduationRate, Some(80.0));
        let no_value = square("2", -105.0, 34.0);
        let data = ChoroplethData::from_regions(
            vec![with_value, no_value],
            vec![],
            Attribute::HighschoolGraduationRate,
            ClassRule::Breakpoints,
        );
        // Small frame: shrink the default scale to keep both squares inside.
        let projection = ProjectionConfig {
            scale: 1500.0,
            ..ProjectionConfig::default()
        };
        let layout = MapLayout::new(&data.counties, &data.background, &projection, 200, 120);

        let buffer = StaticChartRenderer::render_map_rgb(&data, &layout, None).unwrap();
        assert_eq!(buffer.len(), 200 * 120 * 3);

        let albers = crate::charts::projection::AlbersConic::new(&projection, 200.0, 120.0);
        let pixel = |lon: f64, lat: f64| {
            let [x, y] = albers.project(lon, lat);
            let offset = (y.round() as usize * 200 + x.round() as usize) * 3;
            [buffer[offset], buffer[offset + 1], buffer[offset + 2]]
        };

        let fill = data.fill_for(0);
        assert_eq!(pixel(-106.5, 34.5), [fill.r, fill.g, fill.b]);
        assert_eq!(
            pixel(-104.5, 34.5),
            [NO_DATA_COLOR.r, NO_DATA_COLOR.g, NO_DATA_COLOR.b]
        );
        assert_eq!(pixel(-108.5, 35.5), [255, 255, 255]);
    }
}
