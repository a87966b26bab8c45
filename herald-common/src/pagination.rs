use crate::error::PaginationError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A normalised page request.
///
/// Pages are 1-based. A page of `0` is treated as the first page, a size of
/// `0` as [`DEFAULT_PAGE_SIZE`], and sizes above [`MAX_PAGE_SIZE`] are capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaginationQuery {
    page: u32,
    size: u32,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

impl PaginationQuery {
    pub const fn new(page: u32, size: u32) -> Self {
        let page = if page == 0 { DEFAULT_PAGE } else { page };
        let size = match size {
            0 => DEFAULT_PAGE_SIZE,
            size if size > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            size => size,
        };

        Self { page, size }
    }

    /// Builds a query from signed wire values, rejecting negatives.
    pub fn from_signed(page: i64, size: i64) -> Result<Self, PaginationError> {
        let page = Self::unsigned("page", page)?;
        let size = Self::unsigned("size", size)?;

        Ok(Self::new(page, size))
    }

    fn unsigned(field: &'static str, value: i64) -> Result<u32, PaginationError> {
        if value < 0 {
            return Err(PaginationError::Negative { field, value });
        }

        u32::try_from(value).map_err(|_| PaginationError::OutOfRange { field, value })
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Rows to skip: `(page - 1) * size`.
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.size as u64
    }

    pub const fn limit(&self) -> u64 {
        self.size as u64
    }

    /// `ceil(total_count / size)`
    pub const fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(self.size as u64)
    }

    /// `page * size < total_count`
    pub const fn has_more(&self, total_count: u64) -> bool {
        (self.page as u64) * (self.size as u64) < total_count
    }
}
