pub mod calculation;
pub mod model_info;
pub mod property;
pub mod space;

pub use calculation::{
    ComplianceStatus, RoomUsageType, VentilationBatchResult, VentilationInput, VentilationMethod,
    VentilationResult,
};
pub use model_info::{ModelInfo, UploadResponse};
pub use property::{PropertyMap, PropertyValue};
pub use space::{BoundingBox, Geometry3D, Point3D, Space, SpaceList};
