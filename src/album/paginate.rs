use thiserror::Error;

/// Errors of the album pipeline
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumError {
    /// Nothing (or too little) queued to build an album from
    #[error("not enough media to create an album")]
    InsufficientMedia,
}

/// Split `queue` into pages of at most `max_page_size` items.
///
/// Uses the fewest pages possible and balances them: page sizes differ by at
/// most one, larger pages first. Concatenating the pages gives back `queue`.
/// A `max_page_size` of zero is treated as one.
///
/// # Errors
///
/// Returns [`AlbumError::InsufficientMedia`] for an empty queue.
///
/// # Examples
///
/// ```
/// use album_bot::album::{paginate, AlbumError};
///
/// let pages = paginate((0..23).collect::<Vec<_>>(), 10)?;
/// let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();
/// assert_eq!(sizes, vec![8, 8, 7]);
/// # Ok::<(), AlbumError>(())
/// ```
pub fn paginate<T>(queue: Vec<T>, max_page_size: usize) -> Result<Vec<Vec<T>>, AlbumError> {
    let total = queue.len();
    if total == 0 {
        return Err(AlbumError::InsufficientMedia);
    }

    let pages = total.div_ceil(max_page_size.max(1));
    let per_page = total / pages;
    let larger = total % pages;

    let mut items = queue.into_iter();
    Ok((0..pages)
        .map(|page| {
            let size = per_page + usize::from(page < larger);
            items.by_ref().take(size).collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(total: usize, max: usize) -> Vec<usize> {
        paginate(vec![(); total], max)
            .map(|pages| pages.iter().map(Vec::len).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_empty_queue_is_rejected() {
        assert_eq!(
            paginate(Vec::<u8>::new(), 10),
            Err(AlbumError::InsufficientMedia)
        );
    }

    #[test]
    fn test_balanced_sizes() {
        assert_eq!(sizes(1, 10), vec![1]);
        assert_eq!(sizes(10, 10), vec![10]);
        assert_eq!(sizes(11, 10), vec![6, 5]);
        assert_eq!(sizes(20, 10), vec![10, 10]);
        assert_eq!(sizes(23, 10), vec![8, 8, 7]);
        assert_eq!(sizes(5, 2), vec![2, 2, 1]);
    }

    #[test]
    fn test_zero_page_size_means_one() {
        assert_eq!(sizes(3, 0), vec![1, 1, 1]);
    }

    #[test]
    fn test_order_is_preserved() -> Result<(), AlbumError> {
        let pages = paginate(vec!['a', 'b', 'c', 'd', 'e'], 2)?;
        assert_eq!(pages, vec![vec!['a', 'b'], vec!['c', 'd'], vec!['e']]);
        Ok(())
    }
}
