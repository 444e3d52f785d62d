//! framefuse — data-fusion core for multi-device scientific diagnostics.
//!
//! The engine covers three areas, from leaf utilities up:
//!
//! 1. **Geometry** – 2×2 solves, shoelace-family polygon primitives, convex
//!    hull, minimum-area oriented bounding box.
//! 2. **Mask & morph** – polygon simplification (plain and two RDP
//!    variants), Moore-neighbor mask-boundary tracing, connected-component
//!    labeling, and arclength-matched polygon interpolation.
//! 3. **Series & timeline** – resampling of irregularly sampled curves onto
//!    shared time bases (union/intersection policies), and concatenation of
//!    frames from multiple source devices into one logical timeline with
//!    gap-fill, edit history and file discovery.
//!
//! # Public API
//! The main entry points are re-exported at the crate root: the polygon
//! operations, the resampling functions, and [`Timeline`] with its device
//! registry and capability traits.

pub mod geometry;
pub mod mask;
pub mod morph;
pub mod series;
pub mod timeline;

#[cfg(test)]
pub(crate) mod test_utils;

pub use geometry::{
    convex_hull, distance_to_segment, glue, invert_2x2, is_clockwise, is_non_concave, is_rect,
    minimum_area_bbox, polygon_area, polygon_centroid, polygon_descriptors, signed_area, Glue,
    OrientedRect, Point, Polygon, PolygonDescriptors,
};
pub use mask::{extract_mask_polygon, label_image, rdp_simplify, rdp_simplify_budget, simplify_polygon};
pub use morph::interpolate_polygons;
pub use series::{
    extract_times, find_boundaries, resample_all, resample_pair, resample_vector,
    resample_vectors, resample_vectors_auto, Padding, ResampleOptions, ResamplePolicy, Sample,
    SampleVector, TimeRange,
};
pub use timeline::{
    list_files, CancelFlag, DeviceFactory, DeviceRegistry, FileSystem, Frame, FrameData,
    FrameDevice, FrameValue, NullProgress, OpenMode, PhysicalFileSystem, Progress, SharedDevice,
    SortMode, TimeNs, Timeline, TimelineConfig, TimelineError, TimelineState,
};
