use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Zero-based page/size listing parameters, flattened into each list
/// endpoint's query struct.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub size: Option<i64>,
}

impl PageParams {
    pub fn limit(&self) -> i64 {
        self.size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn skip(&self) -> u64 {
        self.page.unwrap_or(0) * self.limit() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let p = PageParams::default();
        assert_eq!(p.limit(), 20);
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn size_is_clamped() {
        let p = PageParams {
            page: Some(2),
            size: Some(500),
        };
        assert_eq!(p.limit(), 100);
        assert_eq!(p.skip(), 200);

        let p = PageParams {
            page: None,
            size: Some(0),
        };
        assert_eq!(p.limit(), 1);
    }
}
