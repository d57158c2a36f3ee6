#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageRequest {
    pub(crate) page: u32,
    pub(crate) limit: u32,
}

impl PageRequest {
    pub(crate) const MAX_LIMIT: u32 = 100;

    /// Zero or missing values fall back to the first page and `default_limit`.
    pub(crate) fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        let page = match page {
            Some(0) | None => 1,
            Some(page) => page,
        };
        let limit = match limit {
            Some(0) | None => default_limit,
            Some(limit) => limit,
        }
        .min(Self::MAX_LIMIT);

        Self { page, limit }
    }

    pub(crate) fn skip(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}
