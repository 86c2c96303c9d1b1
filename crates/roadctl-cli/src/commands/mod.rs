pub mod apply_delta;
pub mod validate_decision;
pub mod validate_roadmap;
