//! Mask geometry: polygon simplification, boundary tracing, labeling.

mod label;
mod simplify;
mod trace;

pub use label::label_image;
pub use simplify::{rdp_simplify, rdp_simplify_budget, simplify_polygon};
pub use trace::extract_mask_polygon;
