//! Entry points validating a request and running exactly one strategy.
//!
//! Every entry point follows the same steps: resolve the optional image list,
//! validate the camera parameters and the options, build one [`Strategy`],
//! then run its task either directly or inside a rendering context thread.
//! Failures before the strategy is built are reported through `log` and turn
//! into [`ExitStatus::Failure`]; failures inside the task are not observed.

use std::path::{Path, PathBuf};

use crate::{
    camera::check_camera_params,
    config::{
        ExhaustiveMatchingOptions, FeaturePairsMatchingOptions, ImagePairsMatchingOptions,
        ImageReaderOptions, SequentialMatchingOptions, SiftExtractionOptions, SiftMatchingOptions,
        SpatialMatchingOptions, TransitiveMatchingOptions, VocabTreeMatchingOptions,
    },
    error::PipelineError,
    gpu::{ContextProvider, GpuContextRunner, GpuSupport, HeadlessContextProvider},
    io::read_text_file_lines,
    strategy::{MatchType, MatchingMethod, Strategy, StrategyFactory, StrategyKind},
};

/// The binary status of a dispatch, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The request was executed or was an empty no-op.
    Success,
    /// The request was rejected before any strategy ran.
    Failure,
}

impl ExitStatus {
    /// Returns true on success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => std::process::ExitCode::SUCCESS,
            ExitStatus::Failure => std::process::ExitCode::FAILURE,
        }
    }
}

/// What a successful dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The strategy of the given kind ran to completion.
    Completed(StrategyKind),
    /// The image list was empty and nothing was done.
    EmptyNoOp,
}

/// Request to extract features.
#[derive(Debug, Clone)]
pub struct FeatureExtractorRequest {
    /// The image reader options.
    pub reader: ImageReaderOptions,
    /// The extraction options.
    pub extraction: SiftExtractionOptions,
    /// Optional file overriding `reader.image_list`, one image per line.
    pub image_list_path: Option<PathBuf>,
}

/// Request to import features.
#[derive(Debug, Clone)]
pub struct FeatureImporterRequest {
    /// The image reader options.
    pub reader: ImageReaderOptions,
    /// Folder with the feature files.
    pub import_path: PathBuf,
    /// Optional file overriding `reader.image_list`, one image per line.
    pub image_list_path: Option<PathBuf>,
}

/// Request to run a matcher configured by `O`.
#[derive(Debug, Clone)]
pub struct MatcherRequest<O> {
    /// Path to the feature database.
    pub database_path: PathBuf,
    /// The descriptor matching options.
    pub matching: SiftMatchingOptions,
    /// The options of the matching algorithm.
    pub options: O,
}

/// Request to import matches from a list file.
#[derive(Debug, Clone)]
pub struct MatchesImporterRequest {
    /// Path to the feature database.
    pub database_path: PathBuf,
    /// The descriptor matching options.
    pub matching: SiftMatchingOptions,
    /// File with the image pairs or feature matches.
    pub match_list_path: PathBuf,
    /// One of `pairs`, `raw` or `inliers`.
    pub match_type: String,
}

/// A request for one of the dispatcher entry points.
#[derive(Debug, Clone)]
pub enum Request {
    /// See [`Dispatcher::run_feature_extractor`].
    FeatureExtractor(FeatureExtractorRequest),
    /// See [`Dispatcher::run_feature_importer`].
    FeatureImporter(FeatureImporterRequest),
    /// See [`Dispatcher::run_exhaustive_matcher`].
    ExhaustiveMatcher(MatcherRequest<ExhaustiveMatchingOptions>),
    /// See [`Dispatcher::run_sequential_matcher`].
    SequentialMatcher(MatcherRequest<SequentialMatchingOptions>),
    /// See [`Dispatcher::run_spatial_matcher`].
    SpatialMatcher(MatcherRequest<SpatialMatchingOptions>),
    /// See [`Dispatcher::run_transitive_matcher`].
    TransitiveMatcher(MatcherRequest<TransitiveMatchingOptions>),
    /// See [`Dispatcher::run_vocab_tree_matcher`].
    VocabTreeMatcher(MatcherRequest<VocabTreeMatchingOptions>),
    /// See [`Dispatcher::run_matches_importer`].
    MatchesImporter(MatchesImporterRequest),
}

impl Request {
    /// The name of the entry point.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FeatureExtractor(_) => "feature_extractor",
            Self::FeatureImporter(_) => "feature_importer",
            Self::ExhaustiveMatcher(_) => "exhaustive_matcher",
            Self::SequentialMatcher(_) => "sequential_matcher",
            Self::SpatialMatcher(_) => "spatial_matcher",
            Self::TransitiveMatcher(_) => "transitive_matcher",
            Self::VocabTreeMatcher(_) => "vocab_tree_matcher",
            Self::MatchesImporter(_) => "matches_importer",
        }
    }
}

/// Replaces the image list with the lines of `image_list_path`, if given.
///
/// An empty path counts as not given. Returns `false` when the resolved list
/// is empty.
fn resolve_image_list(
    reader: &mut ImageReaderOptions,
    image_list_path: Option<&Path>,
) -> Result<bool, PipelineError> {
    let Some(path) = image_list_path.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(true);
    };

    reader.image_list = read_text_file_lines(path).map_err(|source| PipelineError::ImageList {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(!reader.image_list.is_empty())
}

fn matcher<O>(request: MatcherRequest<O>, method: impl FnOnce(O) -> MatchingMethod) -> Strategy {
    Strategy::Matching {
        database_path: request.database_path,
        matching: request.matching,
        method: method(request.options),
    }
}

/// Validates requests and runs their strategy.
///
/// # Example
///
/// ```
/// use kornia_feature::{
///     config::SiftMatchingOptions,
///     dispatch::{Dispatcher, MatcherRequest},
///     dry_run::DryRunFactory,
///     gpu::GpuSupport,
/// };
///
/// let dispatcher = Dispatcher::new(DryRunFactory, GpuSupport::disabled());
/// let status = dispatcher.run_exhaustive_matcher(MatcherRequest {
///     database_path: "database.db".into(),
///     matching: SiftMatchingOptions::default(),
///     options: Default::default(),
/// });
/// assert!(status.is_success());
/// ```
pub struct Dispatcher<F, P = HeadlessContextProvider> {
    factory: F,
    context_provider: P,
    gpu: GpuSupport,
}

impl<F: StrategyFactory> Dispatcher<F> {
    /// Creates a dispatcher using headless rendering contexts.
    pub fn new(factory: F, gpu: GpuSupport) -> Self {
        Self::with_context_provider(factory, HeadlessContextProvider, gpu)
    }
}

impl<F: StrategyFactory, P: ContextProvider> Dispatcher<F, P> {
    /// Creates a dispatcher with a custom rendering context provider.
    pub fn with_context_provider(factory: F, context_provider: P, gpu: GpuSupport) -> Self {
        Self {
            factory,
            context_provider,
            gpu,
        }
    }

    /// The strategy factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Validates the request, then builds and runs its strategy.
    pub fn dispatch(&self, request: Request) -> Result<Outcome, PipelineError> {
        let name = request.name();
        let Some(strategy) = self.prepare(request)? else {
            log::info!("{name}: the image list is empty, nothing to do");
            return Ok(Outcome::EmptyNoOp);
        };

        strategy.check()?;
        self.execute(strategy)
    }

    /// Like [`Self::dispatch`], reporting errors through `log`.
    pub fn run(&self, request: Request) -> ExitStatus {
        let name = request.name();
        match self.dispatch(request) {
            Ok(_) => ExitStatus::Success,
            Err(e) => {
                log::error!("{name}: {e}");
                ExitStatus::Failure
            }
        }
    }

    /// Extracts features from the images.
    pub fn run_feature_extractor(&self, request: FeatureExtractorRequest) -> ExitStatus {
        self.run(Request::FeatureExtractor(request))
    }

    /// Imports externally computed features.
    pub fn run_feature_importer(&self, request: FeatureImporterRequest) -> ExitStatus {
        self.run(Request::FeatureImporter(request))
    }

    /// Matches all image pairs.
    pub fn run_exhaustive_matcher(
        &self,
        request: MatcherRequest<ExhaustiveMatchingOptions>,
    ) -> ExitStatus {
        self.run(Request::ExhaustiveMatcher(request))
    }

    /// Matches consecutive images.
    pub fn run_sequential_matcher(
        &self,
        request: MatcherRequest<SequentialMatchingOptions>,
    ) -> ExitStatus {
        self.run(Request::SequentialMatcher(request))
    }

    /// Matches spatially close images.
    pub fn run_spatial_matcher(&self, request: MatcherRequest<SpatialMatchingOptions>) -> ExitStatus {
        self.run(Request::SpatialMatcher(request))
    }

    /// Matches transitively connected images.
    pub fn run_transitive_matcher(
        &self,
        request: MatcherRequest<TransitiveMatchingOptions>,
    ) -> ExitStatus {
        self.run(Request::TransitiveMatcher(request))
    }

    /// Matches images retrieved from a vocabulary tree.
    pub fn run_vocab_tree_matcher(
        &self,
        request: MatcherRequest<VocabTreeMatchingOptions>,
    ) -> ExitStatus {
        self.run(Request::VocabTreeMatcher(request))
    }

    /// Imports image pairs or feature matches.
    pub fn run_matches_importer(&self, request: MatchesImporterRequest) -> ExitStatus {
        self.run(Request::MatchesImporter(request))
    }

    /// Turns a request into a strategy, `None` for an empty image list.
    fn prepare(&self, request: Request) -> Result<Option<Strategy>, PipelineError> {
        let strategy = match request {
            Request::FeatureExtractor(FeatureExtractorRequest {
                mut reader,
                extraction,
                image_list_path,
            }) => {
                if !resolve_image_list(&mut reader, image_list_path.as_deref())? {
                    return Ok(None);
                }
                check_camera_params(&reader.camera_model, &reader.camera_params)?;
                Strategy::FeatureExtraction { reader, extraction }
            }
            Request::FeatureImporter(FeatureImporterRequest {
                mut reader,
                import_path,
                image_list_path,
            }) => {
                if !resolve_image_list(&mut reader, image_list_path.as_deref())? {
                    return Ok(None);
                }
                check_camera_params(&reader.camera_model, &reader.camera_params)?;
                Strategy::FeatureImport {
                    reader,
                    import_path,
                }
            }
            Request::ExhaustiveMatcher(r) => matcher(r, MatchingMethod::Exhaustive),
            Request::SequentialMatcher(r) => matcher(r, MatchingMethod::Sequential),
            Request::SpatialMatcher(r) => matcher(r, MatchingMethod::Spatial),
            Request::TransitiveMatcher(r) => matcher(r, MatchingMethod::Transitive),
            Request::VocabTreeMatcher(r) => matcher(r, MatchingMethod::VocabTree),
            Request::MatchesImporter(MatchesImporterRequest {
                database_path,
                matching,
                match_list_path,
                match_type,
            }) => {
                let method = match match_type.parse::<MatchType>()? {
                    MatchType::Pairs => MatchingMethod::ImagePairs(ImagePairsMatchingOptions {
                        match_list_path,
                        ..Default::default()
                    }),
                    match_type @ (MatchType::Raw | MatchType::Inliers) => {
                        MatchingMethod::FeaturePairs(FeaturePairsMatchingOptions {
                            verify_matches: match_type.verify_matches(),
                            match_list_path,
                        })
                    }
                };
                Strategy::Matching {
                    database_path,
                    matching,
                    method,
                }
            }
        };

        Ok(Some(strategy))
    }

    /// Builds the task of the strategy and runs it to completion.
    fn execute(&self, strategy: Strategy) -> Result<Outcome, PipelineError> {
        let kind = strategy.kind();
        let use_gpu = strategy.use_gpu() && self.gpu.is_enabled();

        log::debug!("Dispatching {strategy} (gpu: {use_gpu})");
        let mut task = self.factory.build(strategy);

        if use_gpu {
            GpuContextRunner::new(&self.context_provider).run(task.as_mut())?;
        } else {
            task.start();
            task.wait();
        }

        log::debug!("{kind:?} completed");
        Ok(Outcome::Completed(kind))
    }
}
