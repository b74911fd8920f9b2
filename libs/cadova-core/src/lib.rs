//! # Cadova Core
//!
//! The scene description layer and evaluation engine of the Cadova
//! pipeline: fingerprinted scene nodes, the inherited environment, the
//! geometry protocol, result elements, measurements, and the async,
//! memoized lowering engine with an at-most-one computation guarantee per
//! fingerprint.

pub mod build_result;
pub mod elements;
pub mod engine;
pub mod environment;
pub mod error;
pub mod fingerprint;
pub mod geometry;
pub mod measure;
pub mod node;
pub mod options;

pub use build_result::{BuildResult2, BuildResult3, EvaluatedModel};
pub use elements::{
    AnchorTable, Material, MaterialMapping, Part, PartCatalog, PartId, PartSemantic,
    PhysicalProperties, ResultElements, TagTable,
};
pub use engine::{ConcreteResult2, ConcreteResult3, EvaluationContext};
pub use environment::{Environment, EnvironmentKey, EnvironmentValue, Operation};
pub use error::EvaluationError;
pub use fingerprint::{CacheParameter, Fingerprint, FingerprintHasher};
pub use geometry::{ExtrusionRequest, Geometry2, Geometry3};
pub use measure::{MeasurementScope, Measurements2, Measurements3};
pub use node::{
    ExtrusionSpec, GeometryNode2, GeometryNode3, MaskSplitSide, MeshData, ProjectionKind,
    Shape2, Shape3, SplitSide,
};
pub use options::{Compression, FileFormat3D, Metadata, ModelOptions};
