pub mod chart;
pub mod force_graph;
