//! Data models for the detection workflow

pub mod analysis_result;
pub mod detection_error;
pub mod media_source;
pub mod workflow_state;

pub use analysis_result::{AnalysisFeature, AnalysisResult};
pub use detection_error::DetectionError;
pub use media_source::{
    AnalysisRequest, FileUpload, MediaInput, MediaSource, RequestInfo, SourceKind,
    RECORDING_MIME_TYPE,
};
pub use workflow_state::{InputTab, StateTransition, WorkflowState};
