use crate::{
    strategy::{Strategy, StrategyFactory},
    task::{Task, ThreadTask},
};

/// A [`StrategyFactory`] that only reports what a strategy would do.
///
/// Each task logs the resolved plan of its strategy from a worker thread. It is
/// the factory used when no extraction or matching backend is linked.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunFactory;

impl StrategyFactory for DryRunFactory {
    fn build(&self, strategy: Strategy) -> Box<dyn Task> {
        let name = format!("{:?}", strategy.kind());
        Box::new(ThreadTask::new(name, move || {
            log::info!("Running {strategy}");
            if let Strategy::FeatureExtraction { reader, .. } = &strategy {
                for image in &reader.image_list {
                    log::debug!("  {}", reader.image_path.join(image).display());
                }
            }
            log::info!("Finished {:?}", strategy.kind());
        }))
    }
}
