/// An error type for the feature pipeline dispatch.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The camera model name is not registered.
    #[error("Camera model does not exist: {0}")]
    UnknownCameraModel(String),

    /// The camera parameters do not fit the camera model.
    #[error("Invalid camera parameters for {model}: `{params}` (expected {expected})")]
    InvalidCameraParams {
        /// Name of the camera model.
        model: String,
        /// The raw parameter string.
        params: String,
        /// Description of the expected parameters.
        expected: &'static str,
    },

    /// The match type is not one of `pairs`, `raw` or `inliers`.
    #[error("Invalid `match_type`: {0}")]
    InvalidMatchType(String),

    /// An option failed its range check.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The image list file could not be read.
    #[error("Failed to read the image list {path}. {source}")]
    ImageList {
        /// Path to the image list file.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The rendering context could not be acquired.
    #[error("Failed to acquire a rendering context: {0}")]
    RenderContext(String),
}
