mod component;
mod details;

pub use component::ChartView;
