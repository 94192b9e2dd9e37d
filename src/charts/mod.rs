//! Charts module - projection, shared view model and rendering

mod data;
mod map_layout;
mod plotter;
mod projection;
mod renderer;

pub use data::ChoroplethData;
pub use map_layout::MapLayout;
pub use plotter::{ChartPlotter, HIGHLIGHT_COLOR, HIGHLIGHT_WIDTH};
pub use projection::ProjectionConfig;
pub use renderer::StaticChartRenderer;
