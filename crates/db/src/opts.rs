use hackpsu_core::types::Uid;

use crate::uow::QueryOpts;

/// Per-call options for data mapper reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UowOpts {
    /// Restrict the selected columns.
    pub fields: Option<Vec<String>>,
    /// Rendered as `OFFSET`.
    pub start_at: Option<u64>,
    /// Rendered as `LIMIT`.
    pub count: Option<u64>,
    /// Scope rows to one hackathon: `hackathon` if given, else the active one.
    pub by_hackathon: bool,
    pub hackathon: Option<Uid>,
    pub ignore_cache: bool,
    /// Return listings as a lazy stream.
    pub stream: bool,
}

impl UowOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn start_at(mut self, start_at: u64) -> Self {
        self.start_at = Some(start_at);
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn by_hackathon(mut self) -> Self {
        self.by_hackathon = true;
        self
    }

    pub fn hackathon(mut self, hackathon: impl Into<Uid>) -> Self {
        self.by_hackathon = true;
        self.hackathon = Some(hackathon.into());
        self
    }

    pub fn ignore_cache(mut self) -> Self {
        self.ignore_cache = true;
        self
    }

    pub fn stream(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Execution options for a listing read honoring these options.
    pub fn query_opts(&self) -> QueryOpts {
        QueryOpts::cached(!self.ignore_cache).streamed(self.stream)
    }
}
