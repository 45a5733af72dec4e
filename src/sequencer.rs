//! Rate-limited sequential execution
//!
//! A lane runs its operations strictly one after another: operation N+1 does
//! not start until operation N has resolved and the configured delay has
//! elapsed. The pipeline runs several lanes concurrently by partitioning its
//! work list into contiguous chunks, trading wall-clock time against
//! instantaneous request rate.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Drives a sequence of async operations with an enforced minimum delay
/// between them.
#[derive(Debug, Clone, Copy)]
pub struct Sequencer {
    delay: Duration,
}

impl Sequencer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Run `op` over `items` strictly sequentially, sleeping `delay` between
    /// consecutive operations.
    ///
    /// The first failure terminates the lane and surfaces as its result;
    /// operations that should not be lane-fatal must catch their own errors.
    pub async fn run<I, T, F, Fut>(&self, items: I, mut op: F) -> Result<Vec<T>>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut out = Vec::new();
        let mut first = true;
        for item in items {
            if !first {
                sleep(self.delay).await;
            }
            first = false;
            out.push(op(item).await?);
        }
        Ok(out)
    }
}

/// Partition `items` into at most `lanes` contiguous chunks of equal ceiling
/// size. A lane count of zero is treated as one.
pub fn split_lanes<T>(items: Vec<T>, lanes: usize) -> Vec<Vec<T>> {
    let lanes = lanes.max(1);
    if items.is_empty() {
        return Vec::new();
    }
    let chunk = items.len().div_ceil(lanes);
    let mut out = Vec::new();
    let mut rest = items;
    while !rest.is_empty() {
        let tail = rest.split_off(chunk.min(rest.len()));
        out.push(rest);
        rest = tail;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PushtrainError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_operations_run_in_order() {
        let seq = Sequencer::new(Duration::from_millis(0));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let order_ref = order.clone();

        seq.run(0..5u32, |i| {
            let order = order_ref.clone();
            async move {
                order.lock().unwrap().push(i);
                Ok(i)
            }
        })
        .await
        .unwrap();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_delay_enforced_between_operations() {
        let seq = Sequencer::new(Duration::from_millis(20));
        let start = Instant::now();
        seq.run(0..3u32, |i| async move { Ok(i) }).await.unwrap();
        // Two inter-operation delays for three operations
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_failure_terminates_lane() {
        let seq = Sequencer::new(Duration::from_millis(0));
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_ref = ran.clone();

        let result = seq
            .run(0..5u32, |i| {
                let ran = ran_ref.clone();
                async move {
                    if i == 2 {
                        return Err(PushtrainError::Other("boom".into()));
                    }
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(i)
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_split_lanes_contiguous() {
        let chunks = split_lanes((0..10).collect::<Vec<_>>(), 3);
        assert_eq!(chunks, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
    }

    #[test]
    fn test_split_lanes_degenerate_cases() {
        assert!(split_lanes(Vec::<u32>::new(), 4).is_empty());
        assert_eq!(split_lanes(vec![1, 2], 0), vec![vec![1, 2]]);
        assert_eq!(split_lanes(vec![1], 8), vec![vec![1]]);
    }
}
