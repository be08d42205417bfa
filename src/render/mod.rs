//! Render trees, template suggestions and the render pipeline.
//!
//! - [`path`] - get/set/unset/merge on nested render trees by dotted path
//! - [`suggestions`] - theme suggestion generation
//! - [`pipeline`] - preprocessing, template selection and output assembly

pub mod path;
pub mod pipeline;
pub mod suggestions;

pub use path::{PathError, StructPath, template_name_case};
pub use pipeline::{RenderOptions, missing_implementation};
pub use suggestions::suggestions;
