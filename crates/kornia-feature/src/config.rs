//! Configuration of the image reader and of every pipeline strategy.
//!
//! The option structs are plain data with defaults matching the ones used by
//! COLMAP. Each struct has a `check` method validating its ranges; the
//! dispatcher runs the checks before any strategy is constructed.

use std::path::PathBuf;

use crate::error::PipelineError;

fn ensure(cond: bool, msg: &str) -> Result<(), PipelineError> {
    if cond {
        Ok(())
    } else {
        Err(PipelineError::InvalidOption(msg.to_string()))
    }
}

/// Options to read the images and to assign cameras to them.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReaderOptions {
    /// Path to the feature database.
    pub database_path: PathBuf,
    /// Root folder of the images.
    pub image_path: PathBuf,
    /// Images to read, relative to `image_path`. Empty means all images.
    pub image_list: Vec<String>,
    /// Name of the camera model.
    pub camera_model: String,
    /// Comma separated camera parameters. Empty means the model defaults.
    pub camera_params: String,
    /// Whether all images share the same camera.
    pub single_camera: bool,
    /// Whether all images in the same folder share the same camera.
    pub single_camera_per_folder: bool,
    /// Id of an existing camera to assign to all images, `-1` to disable.
    pub existing_camera_id: i32,
    /// Focal length as a factor of the image size when no prior is available.
    pub default_focal_length_factor: f64,
    /// Optional folder with image masks.
    pub camera_mask_path: Option<PathBuf>,
}

impl ImageReaderOptions {
    /// Creates the options for a database and an image folder.
    pub fn new(database_path: impl Into<PathBuf>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            image_path: image_path.into(),
            ..Default::default()
        }
    }

    /// Checks the options.
    pub fn check(&self) -> Result<(), PipelineError> {
        ensure(
            !self.database_path.as_os_str().is_empty(),
            "database_path is required",
        )?;
        ensure(
            !self.image_path.as_os_str().is_empty(),
            "image_path is required",
        )?;
        ensure(
            self.default_focal_length_factor > 0.0,
            "default_focal_length_factor must be positive",
        )?;
        ensure(
            !(self.single_camera && self.single_camera_per_folder),
            "single_camera and single_camera_per_folder are exclusive",
        )
    }
}

impl Default for ImageReaderOptions {
    fn default() -> Self {
        Self {
            database_path: PathBuf::new(),
            image_path: PathBuf::new(),
            image_list: Vec::new(),
            camera_model: "SIMPLE_RADIAL".to_string(),
            camera_params: String::new(),
            single_camera: false,
            single_camera_per_folder: false,
            existing_camera_id: -1,
            default_focal_length_factor: 1.2,
            camera_mask_path: None,
        }
    }
}

/// Options of the SIFT feature extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct SiftExtractionOptions {
    /// Whether to run the extraction on the GPU.
    pub use_gpu: bool,
    /// Comma separated GPU indices, `-1` for all.
    pub gpu_index: String,
    /// Number of CPU threads, `-1` for all cores.
    pub num_threads: i32,
    /// Images larger than this are downscaled.
    pub max_image_size: usize,
    /// Maximum number of features per image.
    pub max_num_features: usize,
}

impl SiftExtractionOptions {
    /// Checks the options.
    pub fn check(&self) -> Result<(), PipelineError> {
        ensure(self.max_image_size > 0, "max_image_size must be positive")?;
        ensure(self.max_num_features > 0, "max_num_features must be positive")
    }
}

impl Default for SiftExtractionOptions {
    fn default() -> Self {
        Self {
            use_gpu: true,
            gpu_index: "-1".to_string(),
            num_threads: -1,
            max_image_size: 3200,
            max_num_features: 8192,
        }
    }
}

/// Options of the SIFT descriptor matching, shared by all matching strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct SiftMatchingOptions {
    /// Whether to run the matching on the GPU.
    pub use_gpu: bool,
    /// Comma separated GPU indices, `-1` for all.
    pub gpu_index: String,
    /// Number of CPU threads, `-1` for all cores.
    pub num_threads: i32,
    /// Maximum distance ratio between the first and second best match.
    pub max_ratio: f64,
    /// Maximum descriptor distance of a match.
    pub max_distance: f64,
    /// Whether to keep only mutual best matches.
    pub cross_check: bool,
    /// Maximum number of matches per image pair.
    pub max_num_matches: usize,
    /// Whether to run guided matching after the geometric verification.
    pub guided_matching: bool,
}

impl SiftMatchingOptions {
    /// Checks the options.
    pub fn check(&self) -> Result<(), PipelineError> {
        ensure(
            self.max_ratio > 0.0 && self.max_ratio <= 1.0,
            "max_ratio must be in (0, 1]",
        )?;
        ensure(
            self.max_distance > 0.0 && self.max_distance <= 1.0,
            "max_distance must be in (0, 1]",
        )?;
        ensure(self.max_num_matches > 0, "max_num_matches must be positive")
    }
}

impl Default for SiftMatchingOptions {
    fn default() -> Self {
        Self {
            use_gpu: true,
            gpu_index: "-1".to_string(),
            num_threads: -1,
            max_ratio: 0.8,
            max_distance: 0.7,
            cross_check: true,
            max_num_matches: 32768,
            guided_matching: false,
        }
    }
}

/// Match every image against every other image, in blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExhaustiveMatchingOptions {
    /// Number of images loaded at the same time.
    pub block_size: usize,
}

impl ExhaustiveMatchingOptions {
    /// Checks the options.
    pub fn check(&self) -> Result<(), PipelineError> {
        ensure(self.block_size > 1, "block_size must be greater than 1")
    }
}

impl Default for ExhaustiveMatchingOptions {
    fn default() -> Self {
        Self { block_size: 50 }
    }
}

/// Match images ordered by name against their neighbours in the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialMatchingOptions {
    /// Number of subsequent images to match.
    pub overlap: usize,
    /// Whether to also match against images at quadratic offsets.
    pub quadratic_overlap: bool,
    /// Whether to detect loops with a vocabulary tree.
    pub loop_detection: bool,
    /// Run the loop detection every this many images.
    pub loop_detection_period: usize,
    /// Number of images retrieved by the loop detection.
    pub loop_detection_num_images: usize,
    /// Vocabulary tree used by the loop detection.
    pub vocab_tree_path: Option<PathBuf>,
}

impl SequentialMatchingOptions {
    /// Checks the options.
    pub fn check(&self) -> Result<(), PipelineError> {
        ensure(self.overlap > 0, "overlap must be positive")?;
        ensure(
            self.loop_detection_period > 0,
            "loop_detection_period must be positive",
        )?;
        ensure(
            self.loop_detection_num_images > 0,
            "loop_detection_num_images must be positive",
        )?;
        ensure(
            !self.loop_detection || self.vocab_tree_path.is_some(),
            "loop_detection requires vocab_tree_path",
        )
    }
}

impl Default for SequentialMatchingOptions {
    fn default() -> Self {
        Self {
            overlap: 10,
            quadratic_overlap: true,
            loop_detection: false,
            loop_detection_period: 10,
            loop_detection_num_images: 50,
            vocab_tree_path: None,
        }
    }
}

/// Match images against their spatial neighbours given by the location priors.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialMatchingOptions {
    /// Whether the location priors are GPS coordinates.
    pub is_gps: bool,
    /// Whether to ignore the altitude.
    pub ignore_z: bool,
    /// Maximum number of neighbours per image.
    pub max_num_neighbors: usize,
    /// Maximum distance to a neighbour.
    pub max_distance: f64,
}

impl SpatialMatchingOptions {
    /// Checks the options.
    pub fn check(&self) -> Result<(), PipelineError> {
        ensure(
            self.max_num_neighbors > 0,
            "max_num_neighbors must be positive",
        )?;
        ensure(self.max_distance > 0.0, "max_distance must be positive")
    }
}

impl Default for SpatialMatchingOptions {
    fn default() -> Self {
        Self {
            is_gps: true,
            ignore_z: true,
            max_num_neighbors: 50,
            max_distance: 100.0,
        }
    }
}

/// Complete the match graph by matching transitively connected images.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitiveMatchingOptions {
    /// Number of image pairs matched per batch.
    pub batch_size: usize,
    /// Number of transitive passes.
    pub num_iterations: usize,
}

impl TransitiveMatchingOptions {
    /// Checks the options.
    pub fn check(&self) -> Result<(), PipelineError> {
        ensure(self.batch_size > 0, "batch_size must be positive")?;
        ensure(self.num_iterations > 0, "num_iterations must be positive")
    }
}

impl Default for TransitiveMatchingOptions {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            num_iterations: 3,
        }
    }
}

/// Match images against their nearest neighbours in a vocabulary tree.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabTreeMatchingOptions {
    /// Number of nearest images to retrieve per query.
    pub num_images: usize,
    /// Number of nearest visual words per feature.
    pub num_nearest_neighbors: usize,
    /// Number of checks of the nearest neighbour search.
    pub num_checks: usize,
    /// Number of images to spatially re-rank, `0` to disable.
    pub num_images_after_verification: usize,
    /// Maximum number of features per image, `-1` for all.
    pub max_num_features: i32,
    /// Path to the vocabulary tree.
    pub vocab_tree_path: PathBuf,
    /// Optional list of query images.
    pub match_list_path: Option<PathBuf>,
}

impl VocabTreeMatchingOptions {
    /// Checks the options.
    pub fn check(&self) -> Result<(), PipelineError> {
        ensure(self.num_images > 0, "num_images must be positive")?;
        ensure(
            self.num_nearest_neighbors > 0,
            "num_nearest_neighbors must be positive",
        )?;
        ensure(self.num_checks > 0, "num_checks must be positive")?;
        ensure(
            !self.vocab_tree_path.as_os_str().is_empty(),
            "vocab_tree_path is required",
        )
    }
}

impl Default for VocabTreeMatchingOptions {
    fn default() -> Self {
        Self {
            num_images: 100,
            num_nearest_neighbors: 5,
            num_checks: 256,
            num_images_after_verification: 0,
            max_num_features: -1,
            vocab_tree_path: PathBuf::new(),
            match_list_path: None,
        }
    }
}

/// Match an explicit list of image pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePairsMatchingOptions {
    /// Number of image pairs matched per block.
    pub block_size: usize,
    /// File with one `image1 image2` pair per line.
    pub match_list_path: PathBuf,
}

impl ImagePairsMatchingOptions {
    /// Checks the options.
    pub fn check(&self) -> Result<(), PipelineError> {
        ensure(self.block_size > 0, "block_size must be positive")
    }
}

impl Default for ImagePairsMatchingOptions {
    fn default() -> Self {
        Self {
            block_size: 1225,
            match_list_path: PathBuf::new(),
        }
    }
}

/// Import externally computed feature matches.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePairsMatchingOptions {
    /// Whether the imported matches still go through geometric verification.
    pub verify_matches: bool,
    /// File with the image pairs followed by their feature matches.
    pub match_list_path: PathBuf,
}

impl Default for FeaturePairsMatchingOptions {
    fn default() -> Self {
        Self {
            verify_matches: true,
            match_list_path: PathBuf::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_pass_checks() -> Result<(), PipelineError> {
        ImageReaderOptions::new("db.db", "images").check()?;
        SiftExtractionOptions::default().check()?;
        SiftMatchingOptions::default().check()?;
        ExhaustiveMatchingOptions::default().check()?;
        SequentialMatchingOptions::default().check()?;
        SpatialMatchingOptions::default().check()?;
        TransitiveMatchingOptions::default().check()?;
        ImagePairsMatchingOptions::default().check()?;
        Ok(())
    }

    #[test]
    fn test_reader_options_check() {
        assert!(ImageReaderOptions::default().check().is_err());

        let options = ImageReaderOptions {
            single_camera: true,
            single_camera_per_folder: true,
            ..ImageReaderOptions::new("db.db", "images")
        };
        assert!(matches!(
            options.check(),
            Err(PipelineError::InvalidOption(_))
        ));

        let options = ImageReaderOptions {
            default_focal_length_factor: 0.0,
            ..ImageReaderOptions::new("db.db", "images")
        };
        assert!(options.check().is_err());
    }

    #[test]
    fn test_matching_checks() {
        assert!(ExhaustiveMatchingOptions { block_size: 1 }.check().is_err());

        let sequential = SequentialMatchingOptions {
            loop_detection: true,
            ..Default::default()
        };
        assert!(sequential.check().is_err());

        let sequential = SequentialMatchingOptions {
            loop_detection: true,
            vocab_tree_path: Some("tree.bin".into()),
            ..Default::default()
        };
        assert!(sequential.check().is_ok());

        assert!(VocabTreeMatchingOptions::default().check().is_err());

        let matching = SiftMatchingOptions {
            max_ratio: 1.5,
            ..Default::default()
        };
        assert!(matching.check().is_err());
    }
}
