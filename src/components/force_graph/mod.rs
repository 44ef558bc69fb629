mod component;
mod interaction;
mod model;
mod render;
mod scheduler;
mod simulation;
mod types;

pub use component::ForceGraphCanvas;
pub use interaction::{ALL, InteractionEngine, MESSAGE_TTL, RelationshipFilter, SearchOutcome};
pub use model::build;
pub use types::{Graph, type_label};
