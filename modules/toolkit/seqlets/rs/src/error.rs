use derive_more::{Display, Error};
use eyre::Report;

/// Failure kinds reported by the extractor and the threshold selectors. They travel inside
/// `eyre::Report` and can be recovered with `report.downcast_ref::<SeqletError>()`.
#[derive(Clone, PartialEq, Debug, Display, Error)]
pub enum SeqletError {
    #[display("Invalid score track: {reason}")]
    InputShape { reason: String },
    #[display("Invalid configuration: {reason}")]
    Configuration { reason: String },
    #[display("No curvature elbow found to the right of the dominant mode ({mode})")]
    ElbowNotFound { mode: f64 },
    #[display("Example {example} has no unsuppressed positions to average the background over")]
    DegenerateBackground { example: usize },
    #[display("Values can't support a density estimate: {reason}")]
    DegenerateDistribution { reason: String },
}

impl SeqletError {
    pub(crate) fn shape(reason: impl Into<String>) -> Report {
        SeqletError::InputShape {
            reason: reason.into(),
        }
        .into()
    }

    pub(crate) fn config(reason: impl Into<String>) -> Report {
        SeqletError::Configuration {
            reason: reason.into(),
        }
        .into()
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Report {
        SeqletError::DegenerateDistribution {
            reason: reason.into(),
        }
        .into()
    }
}
