/// Events emitted by the clustering pipeline as it moves through its phases.
#[derive(Debug, Clone)]
pub enum Progress {
    /// A named pipeline phase (filtering, threshold estimation, graph
    /// construction, extraction) has begun.
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// A short, human-readable status line for the current phase, e.g. the
    /// running count of exact distance evaluations.
    StatusUpdate { text: String },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional caller-supplied callback.
///
/// The pipeline reports through this unconditionally; a reporter without a
/// callback makes reporting a no-op.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
