//! Batch sizing and retry math.
//!
//! Pure helpers shared by the batch executor and the accessors. Nothing here
//! sleeps or talks to the store.

mod retry;

pub use retry::RetryPolicy;

/// Maximum number of put/delete requests the store accepts in one batch write.
pub const MAX_BATCH_WRITE_SIZE: usize = 25;

/// Maximum number of keys the store accepts in one batch get.
pub const MAX_BATCH_GET_SIZE: usize = 100;

/// Splits `items` into contiguous chunks of at most `size` items.
///
/// Order is preserved within and across chunks. A `size` of zero is treated
/// as one.
pub fn chunk<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(items.len()));

    for item in items {
        current.push(item);
        if current.len() == size {
            chunks.push(std::mem::replace(
                &mut current,
                Vec::with_capacity(size),
            ));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_sizes() {
        let items: Vec<usize> = (0..3 * MAX_BATCH_WRITE_SIZE + 1).collect();
        let chunks = chunk(items, MAX_BATCH_WRITE_SIZE);

        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() <= MAX_BATCH_WRITE_SIZE));
        assert_eq!(chunks[3], vec![75]);
    }

    #[test]
    fn test_chunk_preserves_order() {
        let chunks = chunk(vec![1, 2, 3, 4, 5], 2);
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_chunk_exact_multiple() {
        let chunks = chunk((0..50).collect::<Vec<_>>(), 25);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].len(), 25);
    }

    #[test]
    fn test_chunk_empty() {
        assert!(chunk(Vec::<u8>::new(), 25).is_empty());
    }

    #[test]
    fn test_chunk_zero_size() {
        assert_eq!(chunk(vec![1, 2], 0), vec![vec![1], vec![2]]);
    }
}
