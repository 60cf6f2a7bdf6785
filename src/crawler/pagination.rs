//! Search pagination decisions
//!
//! The search feed reports where the current page starts, how many results a
//! page holds and how many results exist in total. From those counters alone
//! we decide whether to request another page and at which offset.

use crate::extract::{ExtractError, ExtractResult};
use crate::types::NavigationInfo;

/// Returns true if another search page should be requested
///
/// Another page is requested only while strictly more than one page's worth of
/// results remains from the current start. A remainder exactly equal to the
/// page size is treated as fully served by the current page.
///
/// # Example
///
/// ```
/// use listing_harvest::crawler::has_next_page;
/// use listing_harvest::NavigationInfo;
///
/// let nav = NavigationInfo { start_result: 20, results_per_page: 10, total_results: 25 };
/// assert!(!has_next_page(&nav));
/// ```
pub fn has_next_page(nav: &NavigationInfo) -> bool {
    // Saturating: a start beyond the reported total means nothing remains
    let remaining = nav.total_results.saturating_sub(nav.start_result);
    remaining > nav.results_per_page
}

/// Cursor for the page after the one described by `nav`
///
/// Returns `None` if the offset does not fit in a `u64`. That cannot happen
/// while `has_next_page(nav)` holds, since the next offset is then below
/// `total_results`.
pub fn next_cursor(nav: &NavigationInfo) -> Option<u64> {
    nav.start_result.checked_add(nav.results_per_page)
}

/// Checks a page's counters against the cursor that was requested
///
/// A page may not start before the requested offset. With a non-zero page
/// size this keeps the cursor strictly increasing from page to page.
pub fn check_navigation(nav: &NavigationInfo, requested: u64) -> ExtractResult<()> {
    if nav.start_result < requested {
        return Err(ExtractError::invalid(
            "pagination.props.startResult",
            format!("{} is behind the requested offset {}", nav.start_result, requested),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(start_result: u64, results_per_page: u64, total_results: u64) -> NavigationInfo {
        NavigationInfo {
            start_result,
            results_per_page,
            total_results,
        }
    }

    #[test]
    fn test_first_page_of_many() {
        assert!(has_next_page(&nav(0, 10, 25)));
    }

    #[test]
    fn test_middle_page() {
        // 15 remaining > 10 per page
        assert!(has_next_page(&nav(10, 10, 25)));
    }

    #[test]
    fn test_last_partial_page() {
        // 5 remaining <= 10 per page
        assert!(!has_next_page(&nav(20, 10, 25)));
    }

    #[test]
    fn test_remainder_equal_to_page_size() {
        assert!(!has_next_page(&nav(10, 10, 20)));
    }

    #[test]
    fn test_empty_result_set() {
        assert!(!has_next_page(&nav(0, 10, 0)));
    }

    #[test]
    fn test_start_past_total() {
        assert!(!has_next_page(&nav(30, 10, 25)));
    }

    #[test]
    fn test_next_cursor() {
        assert_eq!(next_cursor(&nav(10, 10, 25)), Some(20));
        assert_eq!(next_cursor(&nav(0, 10, 25)), Some(10));
    }

    #[test]
    fn test_next_cursor_overflow() {
        assert_eq!(next_cursor(&nav(u64::MAX - 5, 10, u64::MAX)), None);
    }

    #[test]
    fn test_check_navigation_accepts_requested_offset() {
        assert!(check_navigation(&nav(0, 10, 25), 0).is_ok());
        assert!(check_navigation(&nav(20, 10, 25), 20).is_ok());
    }

    #[test]
    fn test_check_navigation_rejects_stale_start() {
        // Server ignored `start=10` and answered with the first page again
        let err = check_navigation(&nav(0, 10, 25), 10).unwrap_err();
        assert!(err.to_string().contains("startResult"));
    }

    #[test]
    fn test_huge_counters_do_not_overflow() {
        let current = nav(u64::MAX - 20, 10, u64::MAX);
        assert!(has_next_page(&current));
        assert_eq!(next_cursor(&current), Some(u64::MAX - 10));
        assert!(!has_next_page(&nav(u64::MAX - 10, 10, u64::MAX)));
    }

    #[test]
    fn test_walk_terminates() {
        let total = 95;
        let mut cursor = 0;
        let mut pages = 1;

        loop {
            let current = nav(cursor, 10, total);
            if !has_next_page(&current) {
                break;
            }
            check_navigation(&current, cursor).unwrap();
            cursor = next_cursor(&current).unwrap();
            pages += 1;
        }

        assert_eq!(pages, 10);
        assert_eq!(cursor, 90);
    }
}
