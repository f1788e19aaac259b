use std::path::PathBuf;

use crate::{
    config::{
        ExhaustiveMatchingOptions, FeaturePairsMatchingOptions, ImagePairsMatchingOptions,
        ImageReaderOptions, SequentialMatchingOptions, SiftExtractionOptions, SiftMatchingOptions,
        SpatialMatchingOptions, TransitiveMatchingOptions, VocabTreeMatchingOptions,
    },
    error::PipelineError,
    task::Task,
};

/// The kind of a pipeline strategy, without its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Extract features from a set of images.
    FeatureExtraction,
    /// Import externally computed features.
    FeatureImport,
    /// Match all image pairs.
    ExhaustiveMatching,
    /// Match images within a sequence window.
    SequentialMatching,
    /// Match spatially close images.
    SpatialMatching,
    /// Match transitively connected images.
    TransitiveMatching,
    /// Match images retrieved from a vocabulary tree.
    VocabTreeMatching,
    /// Match an explicit list of image pairs.
    ImagePairsMatching,
    /// Import raw or verified feature matches.
    FeaturePairsMatching,
}

/// The matching algorithm of a [`Strategy::Matching`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatchingMethod {
    /// See [`ExhaustiveMatchingOptions`].
    Exhaustive(ExhaustiveMatchingOptions),
    /// See [`SequentialMatchingOptions`].
    Sequential(SequentialMatchingOptions),
    /// See [`SpatialMatchingOptions`].
    Spatial(SpatialMatchingOptions),
    /// See [`TransitiveMatchingOptions`].
    Transitive(TransitiveMatchingOptions),
    /// See [`VocabTreeMatchingOptions`].
    VocabTree(VocabTreeMatchingOptions),
    /// See [`ImagePairsMatchingOptions`].
    ImagePairs(ImagePairsMatchingOptions),
    /// See [`FeaturePairsMatchingOptions`].
    FeaturePairs(FeaturePairsMatchingOptions),
}

impl MatchingMethod {
    /// Checks the options of the method.
    pub fn check(&self) -> Result<(), PipelineError> {
        match self {
            Self::Exhaustive(options) => options.check(),
            Self::Sequential(options) => options.check(),
            Self::Spatial(options) => options.check(),
            Self::Transitive(options) => options.check(),
            Self::VocabTree(options) => options.check(),
            Self::ImagePairs(options) => options.check(),
            Self::FeaturePairs(_) => Ok(()),
        }
    }
}

/// A fully configured pipeline strategy.
///
/// The dispatcher builds exactly one strategy per invocation and hands it to a
/// [`StrategyFactory`], which owns the configuration from then on.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Extract features from the images.
    FeatureExtraction {
        /// The image reader options.
        reader: ImageReaderOptions,
        /// The extraction options.
        extraction: SiftExtractionOptions,
    },
    /// Import features from text files next to the images.
    FeatureImport {
        /// The image reader options.
        reader: ImageReaderOptions,
        /// Folder with one feature file per image.
        import_path: PathBuf,
    },
    /// Match the features stored in a database.
    Matching {
        /// Path to the feature database.
        database_path: PathBuf,
        /// The descriptor matching options.
        matching: SiftMatchingOptions,
        /// The matching algorithm.
        method: MatchingMethod,
    },
}

impl Strategy {
    /// The kind of the strategy.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::FeatureExtraction { .. } => StrategyKind::FeatureExtraction,
            Self::FeatureImport { .. } => StrategyKind::FeatureImport,
            Self::Matching { method, .. } => match method {
                MatchingMethod::Exhaustive(_) => StrategyKind::ExhaustiveMatching,
                MatchingMethod::Sequential(_) => StrategyKind::SequentialMatching,
                MatchingMethod::Spatial(_) => StrategyKind::SpatialMatching,
                MatchingMethod::Transitive(_) => StrategyKind::TransitiveMatching,
                MatchingMethod::VocabTree(_) => StrategyKind::VocabTreeMatching,
                MatchingMethod::ImagePairs(_) => StrategyKind::ImagePairsMatching,
                MatchingMethod::FeaturePairs(_) => StrategyKind::FeaturePairsMatching,
            },
        }
    }

    /// Whether the strategy asks to run on the GPU.
    ///
    /// Feature import never runs on the GPU.
    pub fn use_gpu(&self) -> bool {
        match self {
            Self::FeatureExtraction { extraction, .. } => extraction.use_gpu,
            Self::FeatureImport { .. } => false,
            Self::Matching { matching, .. } => matching.use_gpu,
        }
    }

    /// Checks all the options of the strategy.
    pub fn check(&self) -> Result<(), PipelineError> {
        match self {
            Self::FeatureExtraction { reader, extraction } => {
                reader.check()?;
                extraction.check()
            }
            Self::FeatureImport { reader, .. } => reader.check(),
            Self::Matching {
                database_path,
                matching,
                method,
            } => {
                if database_path.as_os_str().is_empty() {
                    return Err(PipelineError::InvalidOption(
                        "database_path is required".to_string(),
                    ));
                }
                matching.check()?;
                method.check()
            }
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FeatureExtraction { reader, extraction } => {
                write!(
                    f,
                    "feature extraction from {} into {} ({} camera, ",
                    reader.image_path.display(),
                    reader.database_path.display(),
                    reader.camera_model
                )?;
                match reader.image_list.len() {
                    0 => write!(f, "all images")?,
                    n => write!(f, "{n} images")?,
                }
                write!(f, ", max {} features)", extraction.max_num_features)
            }
            Self::FeatureImport {
                reader,
                import_path,
            } => write!(
                f,
                "feature import from {} into {}",
                import_path.display(),
                reader.database_path.display()
            ),
            Self::Matching {
                database_path,
                method,
                ..
            } => {
                match method {
                    MatchingMethod::Exhaustive(o) => {
                        write!(f, "exhaustive matching, block size {}", o.block_size)?
                    }
                    MatchingMethod::Sequential(o) => write!(
                        f,
                        "sequential matching, overlap {} (quadratic: {}, loop detection: {})",
                        o.overlap, o.quadratic_overlap, o.loop_detection
                    )?,
                    MatchingMethod::Spatial(o) => write!(
                        f,
                        "spatial matching, {} neighbors within {}",
                        o.max_num_neighbors, o.max_distance
                    )?,
                    MatchingMethod::Transitive(o) => write!(
                        f,
                        "transitive matching, {} iterations of {} pairs",
                        o.num_iterations, o.batch_size
                    )?,
                    MatchingMethod::VocabTree(o) => write!(
                        f,
                        "vocabulary tree matching with {}, {} images per query",
                        o.vocab_tree_path.display(),
                        o.num_images
                    )?,
                    MatchingMethod::ImagePairs(o) => write!(
                        f,
                        "image pairs matching from {}",
                        o.match_list_path.display()
                    )?,
                    MatchingMethod::FeaturePairs(o) => write!(
                        f,
                        "feature pairs import from {} (verify: {})",
                        o.match_list_path.display(),
                        o.verify_matches
                    )?,
                }
                write!(f, " in {}", database_path.display())
            }
        }
    }
}

/// The match type of imported matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// A list of image pairs to match.
    Pairs,
    /// Raw feature matches, geometrically verified on import.
    Raw,
    /// Already verified feature matches, imported as inliers.
    Inliers,
}

impl MatchType {
    /// Whether the imported matches go through geometric verification.
    ///
    /// Only meaningful for [`MatchType::Raw`] and [`MatchType::Inliers`].
    pub fn verify_matches(&self) -> bool {
        matches!(self, Self::Raw)
    }
}

impl std::str::FromStr for MatchType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pairs" => Ok(Self::Pairs),
            "raw" => Ok(Self::Raw),
            "inliers" => Ok(Self::Inliers),
            _ => Err(PipelineError::InvalidMatchType(s.to_string())),
        }
    }
}

/// Builds the runnable task of a strategy.
///
/// This is the seam to the feature extraction and matching implementations.
pub trait StrategyFactory {
    /// Creates a task, not started yet, running the given strategy.
    fn build(&self, strategy: Strategy) -> Box<dyn Task>;
}

impl<F: StrategyFactory + ?Sized> StrategyFactory for &F {
    fn build(&self, strategy: Strategy) -> Box<dyn Task> {
        (**self).build(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matching(method: MatchingMethod) -> Strategy {
        Strategy::Matching {
            database_path: "db.db".into(),
            matching: SiftMatchingOptions::default(),
            method,
        }
    }

    #[test]
    fn test_match_type() -> Result<(), PipelineError> {
        assert_eq!("pairs".parse::<MatchType>()?, MatchType::Pairs);
        assert!("raw".parse::<MatchType>()?.verify_matches());
        assert!(!"inliers".parse::<MatchType>()?.verify_matches());
        assert!(matches!(
            "Pairs".parse::<MatchType>(),
            Err(PipelineError::InvalidMatchType(_))
        ));
        assert!("".parse::<MatchType>().is_err());
        Ok(())
    }

    #[test]
    fn test_kind_and_gpu() {
        let strategy = Strategy::FeatureImport {
            reader: ImageReaderOptions::new("db.db", "images"),
            import_path: "features".into(),
        };
        assert_eq!(strategy.kind(), StrategyKind::FeatureImport);
        assert!(!strategy.use_gpu());

        let strategy = matching(MatchingMethod::Spatial(Default::default()));
        assert_eq!(strategy.kind(), StrategyKind::SpatialMatching);
        assert!(strategy.use_gpu());
    }

    #[test]
    fn test_check() {
        assert!(matching(MatchingMethod::Exhaustive(Default::default()))
            .check()
            .is_ok());
        assert!(matching(MatchingMethod::VocabTree(Default::default()))
            .check()
            .is_err());

        let strategy = Strategy::Matching {
            database_path: "".into(),
            matching: SiftMatchingOptions::default(),
            method: MatchingMethod::Transitive(Default::default()),
        };
        assert!(strategy.check().is_err());
    }

    #[test]
    fn test_display() {
        let strategy = matching(MatchingMethod::Exhaustive(Default::default()));
        assert_eq!(
            strategy.to_string(),
            "exhaustive matching, block size 50 in db.db"
        );
    }
}
