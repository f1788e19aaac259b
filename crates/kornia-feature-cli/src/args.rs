use std::path::PathBuf;

use argh::FromArgs;
use kornia_feature::{
    config::{
        ExhaustiveMatchingOptions, ImageReaderOptions, SequentialMatchingOptions,
        SiftExtractionOptions, SiftMatchingOptions, SpatialMatchingOptions,
        TransitiveMatchingOptions, VocabTreeMatchingOptions,
    },
    dispatch::{
        FeatureExtractorRequest, FeatureImporterRequest, MatchesImporterRequest, MatcherRequest,
        Request,
    },
};

#[derive(FromArgs)]
/// Extract and match image features
pub struct Args {
    #[argh(subcommand)]
    pub command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
pub enum Command {
    FeatureExtractor(FeatureExtractorArgs),
    FeatureImporter(FeatureImporterArgs),
    ExhaustiveMatcher(ExhaustiveMatcherArgs),
    MatchesImporter(MatchesImporterArgs),
    SequentialMatcher(SequentialMatcherArgs),
    SpatialMatcher(SpatialMatcherArgs),
    TransitiveMatcher(TransitiveMatcherArgs),
    VocabTreeMatcher(VocabTreeMatcherArgs),
}

impl Command {
    /// Converts the parsed arguments into a dispatcher request.
    pub fn into_request(self) -> Request {
        match self {
            Self::FeatureExtractor(args) => Request::FeatureExtractor(args.into()),
            Self::FeatureImporter(args) => Request::FeatureImporter(args.into()),
            Self::ExhaustiveMatcher(args) => Request::ExhaustiveMatcher(args.into()),
            Self::MatchesImporter(args) => Request::MatchesImporter(args.into()),
            Self::SequentialMatcher(args) => Request::SequentialMatcher(args.into()),
            Self::SpatialMatcher(args) => Request::SpatialMatcher(args.into()),
            Self::TransitiveMatcher(args) => Request::TransitiveMatcher(args.into()),
            Self::VocabTreeMatcher(args) => Request::VocabTreeMatcher(args.into()),
        }
    }
}

fn sift_matching(use_gpu: bool, gpu_index: String, num_threads: i32) -> SiftMatchingOptions {
    SiftMatchingOptions {
        use_gpu,
        gpu_index,
        num_threads,
        ..Default::default()
    }
}

#[derive(FromArgs)]
/// Extract features from a set of images
#[argh(subcommand, name = "feature_extractor")]
pub struct FeatureExtractorArgs {
    /// path to the feature database
    #[argh(option)]
    database_path: PathBuf,

    /// root folder of the images
    #[argh(option)]
    image_path: PathBuf,

    /// file with the images to process, one per line
    #[argh(option)]
    image_list_path: Option<PathBuf>,

    /// name of the camera model
    #[argh(option, default = "String::from(\"SIMPLE_RADIAL\")")]
    camera_model: String,

    /// comma separated camera parameters
    #[argh(option, default = "String::new()")]
    camera_params: String,

    /// whether all images share the same camera
    #[argh(switch)]
    single_camera: bool,

    /// whether to run on the GPU
    #[argh(option, default = "true")]
    use_gpu: bool,

    /// comma separated GPU indices, -1 for all
    #[argh(option, default = "String::from(\"-1\")")]
    gpu_index: String,

    /// number of CPU threads, -1 for all cores
    #[argh(option, default = "-1")]
    num_threads: i32,

    /// maximum number of features per image
    #[argh(option, default = "8192")]
    max_num_features: usize,
}

impl From<FeatureExtractorArgs> for FeatureExtractorRequest {
    fn from(args: FeatureExtractorArgs) -> Self {
        Self {
            reader: ImageReaderOptions {
                camera_model: args.camera_model,
                camera_params: args.camera_params,
                single_camera: args.single_camera,
                ..ImageReaderOptions::new(args.database_path, args.image_path)
            },
            extraction: SiftExtractionOptions {
                use_gpu: args.use_gpu,
                gpu_index: args.gpu_index,
                num_threads: args.num_threads,
                max_num_features: args.max_num_features,
                ..Default::default()
            },
            image_list_path: args.image_list_path,
        }
    }
}

#[derive(FromArgs)]
/// Import features computed by another tool
#[argh(subcommand, name = "feature_importer")]
pub struct FeatureImporterArgs {
    /// path to the feature database
    #[argh(option)]
    database_path: PathBuf,

    /// root folder of the images
    #[argh(option)]
    image_path: PathBuf,

    /// folder with one feature file per image
    #[argh(option)]
    import_path: PathBuf,

    /// file with the images to process, one per line
    #[argh(option)]
    image_list_path: Option<PathBuf>,

    /// name of the camera model
    #[argh(option, default = "String::from(\"SIMPLE_RADIAL\")")]
    camera_model: String,

    /// comma separated camera parameters
    #[argh(option, default = "String::new()")]
    camera_params: String,

    /// whether all images share the same camera
    #[argh(switch)]
    single_camera: bool,
}

impl From<FeatureImporterArgs> for FeatureImporterRequest {
    fn from(args: FeatureImporterArgs) -> Self {
        Self {
            reader: ImageReaderOptions {
                camera_model: args.camera_model,
                camera_params: args.camera_params,
                single_camera: args.single_camera,
                ..ImageReaderOptions::new(args.database_path, args.image_path)
            },
            import_path: args.import_path,
            image_list_path: args.image_list_path,
        }
    }
}

#[derive(FromArgs)]
/// Match every image against every other image
#[argh(subcommand, name = "exhaustive_matcher")]
pub struct ExhaustiveMatcherArgs {
    /// path to the feature database
    #[argh(option)]
    database_path: PathBuf,

    /// number of images loaded at the same time
    #[argh(option, default = "50")]
    block_size: usize,

    /// whether to run on the GPU
    #[argh(option, default = "true")]
    use_gpu: bool,

    /// comma separated GPU indices, -1 for all
    #[argh(option, default = "String::from(\"-1\")")]
    gpu_index: String,

    /// number of CPU threads, -1 for all cores
    #[argh(option, default = "-1")]
    num_threads: i32,
}

impl From<ExhaustiveMatcherArgs> for MatcherRequest<ExhaustiveMatchingOptions> {
    fn from(args: ExhaustiveMatcherArgs) -> Self {
        Self {
            database_path: args.database_path,
            matching: sift_matching(args.use_gpu, args.gpu_index, args.num_threads),
            options: ExhaustiveMatchingOptions {
                block_size: args.block_size,
            },
        }
    }
}

#[derive(FromArgs)]
/// Import image pairs or feature matches from a list file
#[argh(subcommand, name = "matches_importer")]
pub struct MatchesImporterArgs {
    /// path to the feature database
    #[argh(option)]
    database_path: PathBuf,

    /// file with the image pairs or feature matches
    #[argh(option)]
    match_list_path: PathBuf,

    /// one of pairs, raw or inliers
    #[argh(option, default = "String::from(\"pairs\")")]
    match_type: String,

    /// whether to run on the GPU
    #[argh(option, default = "true")]
    use_gpu: bool,

    /// comma separated GPU indices, -1 for all
    #[argh(option, default = "String::from(\"-1\")")]
    gpu_index: String,

    /// number of CPU threads, -1 for all cores
    #[argh(option, default = "-1")]
    num_threads: i32,
}

impl From<MatchesImporterArgs> for MatchesImporterRequest {
    fn from(args: MatchesImporterArgs) -> Self {
        Self {
            database_path: args.database_path,
            matching: sift_matching(args.use_gpu, args.gpu_index, args.num_threads),
            match_list_path: args.match_list_path,
            match_type: args.match_type,
        }
    }
}

#[derive(FromArgs)]
/// Match images against their neighbours in the sequence
#[argh(subcommand, name = "sequential_matcher")]
pub struct SequentialMatcherArgs {
    /// path to the feature database
    #[argh(option)]
    database_path: PathBuf,

    /// number of subsequent images to match
    #[argh(option, default = "10")]
    overlap: usize,

    /// whether to also match images at quadratic offsets
    #[argh(option, default = "true")]
    quadratic_overlap: bool,

    /// enable the loop detection
    #[argh(switch)]
    loop_detection: bool,

    /// vocabulary tree used by the loop detection
    #[argh(option)]
    vocab_tree_path: Option<PathBuf>,

    /// whether to run on the GPU
    #[argh(option, default = "true")]
    use_gpu: bool,

    /// comma separated GPU indices, -1 for all
    #[argh(option, default = "String::from(\"-1\")")]
    gpu_index: String,

    /// number of CPU threads, -1 for all cores
    #[argh(option, default = "-1")]
    num_threads: i32,
}

impl From<SequentialMatcherArgs> for MatcherRequest<SequentialMatchingOptions> {
    fn from(args: SequentialMatcherArgs) -> Self {
        Self {
            database_path: args.database_path,
            matching: sift_matching(args.use_gpu, args.gpu_index, args.num_threads),
            options: SequentialMatchingOptions {
                overlap: args.overlap,
                quadratic_overlap: args.quadratic_overlap,
                loop_detection: args.loop_detection,
                vocab_tree_path: args.vocab_tree_path,
                ..Default::default()
            },
        }
    }
}

#[derive(FromArgs)]
/// Match images against their spatial neighbours
#[argh(subcommand, name = "spatial_matcher")]
pub struct SpatialMatcherArgs {
    /// path to the feature database
    #[argh(option)]
    database_path: PathBuf,

    /// whether the location priors are GPS coordinates
    #[argh(option, default = "true")]
    is_gps: bool,

    /// whether to ignore the altitude
    #[argh(option, default = "true")]
    ignore_z: bool,

    /// maximum number of neighbours per image
    #[argh(option, default = "50")]
    max_num_neighbors: usize,

    /// maximum distance to a neighbour
    #[argh(option, default = "100.0")]
    max_distance: f64,

    /// whether to run on the GPU
    #[argh(option, default = "true")]
    use_gpu: bool,

    /// comma separated GPU indices, -1 for all
    #[argh(option, default = "String::from(\"-1\")")]
    gpu_index: String,

    /// number of CPU threads, -1 for all cores
    #[argh(option, default = "-1")]
    num_threads: i32,
}

impl From<SpatialMatcherArgs> for MatcherRequest<SpatialMatchingOptions> {
    fn from(args: SpatialMatcherArgs) -> Self {
        Self {
            database_path: args.database_path,
            matching: sift_matching(args.use_gpu, args.gpu_index, args.num_threads),
            options: SpatialMatchingOptions {
                is_gps: args.is_gps,
                ignore_z: args.ignore_z,
                max_num_neighbors: args.max_num_neighbors,
                max_distance: args.max_distance,
            },
        }
    }
}

#[derive(FromArgs)]
/// Match transitively connected images
#[argh(subcommand, name = "transitive_matcher")]
pub struct TransitiveMatcherArgs {
    /// path to the feature database
    #[argh(option)]
    database_path: PathBuf,

    /// number of image pairs matched per batch
    #[argh(option, default = "1000")]
    batch_size: usize,

    /// number of transitive passes
    #[argh(option, default = "3")]
    num_iterations: usize,

    /// whether to run on the GPU
    #[argh(option, default = "true")]
    use_gpu: bool,

    /// comma separated GPU indices, -1 for all
    #[argh(option, default = "String::from(\"-1\")")]
    gpu_index: String,

    /// number of CPU threads, -1 for all cores
    #[argh(option, default = "-1")]
    num_threads: i32,
}

impl From<TransitiveMatcherArgs> for MatcherRequest<TransitiveMatchingOptions> {
    fn from(args: TransitiveMatcherArgs) -> Self {
        Self {
            database_path: args.database_path,
            matching: sift_matching(args.use_gpu, args.gpu_index, args.num_threads),
            options: TransitiveMatchingOptions {
                batch_size: args.batch_size,
                num_iterations: args.num_iterations,
            },
        }
    }
}

#[derive(FromArgs)]
/// Match images retrieved from a vocabulary tree
#[argh(subcommand, name = "vocab_tree_matcher")]
pub struct VocabTreeMatcherArgs {
    /// path to the feature database
    #[argh(option)]
    database_path: PathBuf,

    /// path to the vocabulary tree
    #[argh(option)]
    vocab_tree_path: PathBuf,

    /// number of nearest images per query
    #[argh(option, default = "100")]
    num_images: usize,

    /// optional list of query images
    #[argh(option)]
    match_list_path: Option<PathBuf>,

    /// whether to run on the GPU
    #[argh(option, default = "true")]
    use_gpu: bool,

    /// comma separated GPU indices, -1 for all
    #[argh(option, default = "String::from(\"-1\")")]
    gpu_index: String,

    /// number of CPU threads, -1 for all cores
    #[argh(option, default = "-1")]
    num_threads: i32,
}

impl From<VocabTreeMatcherArgs> for MatcherRequest<VocabTreeMatchingOptions> {
    fn from(args: VocabTreeMatcherArgs) -> Self {
        Self {
            database_path: args.database_path,
            matching: sift_matching(args.use_gpu, args.gpu_index, args.num_threads),
            options: VocabTreeMatchingOptions {
                num_images: args.num_images,
                vocab_tree_path: args.vocab_tree_path,
                match_list_path: args.match_list_path,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Request {
        Args::from_args(&["kornia-feature"], args)
            .map(|args| args.command.into_request())
            .unwrap_or_else(|e| panic!("failed to parse {args:?}: {}", e.output))
    }

    #[test]
    fn test_feature_extractor_args() {
        let request = parse(&[
            "feature_extractor",
            "--database-path",
            "db.db",
            "--image-path",
            "images",
            "--camera-model",
            "PINHOLE",
            "--camera-params",
            "800,800,320,240",
            "--use-gpu",
            "false",
        ]);

        let Request::FeatureExtractor(request) = request else {
            panic!("unexpected request {request:?}");
        };
        assert_eq!(request.reader.camera_model, "PINHOLE");
        assert_eq!(request.reader.camera_params, "800,800,320,240");
        assert!(!request.extraction.use_gpu);
        assert!(request.image_list_path.is_none());
    }

    #[test]
    fn test_matches_importer_args() {
        let request = parse(&[
            "matches_importer",
            "--database-path",
            "db.db",
            "--match-list-path",
            "matches.txt",
        ]);

        let Request::MatchesImporter(request) = request else {
            panic!("unexpected request {request:?}");
        };
        assert_eq!(request.match_type, "pairs");
        assert!(request.matching.use_gpu);
    }

    #[test]
    fn test_sequential_matcher_args() {
        let request = parse(&[
            "sequential_matcher",
            "--database-path",
            "db.db",
            "--overlap",
            "5",
            "--loop-detection",
        ]);

        let Request::SequentialMatcher(request) = request else {
            panic!("unexpected request {request:?}");
        };
        assert_eq!(request.options.overlap, 5);
        assert!(request.options.loop_detection);
        assert!(request.options.vocab_tree_path.is_none());
    }

    #[test]
    fn test_missing_required_option() {
        assert!(Args::from_args(&["kornia-feature"], &["exhaustive_matcher"]).is_err());
    }
}
