//! Bounded concurrent fan-out and result reconciliation.

use std::collections::HashSet;
use std::future::Future;

use futures::stream::{self, StreamExt};

use crate::models::PlaceResult;

/// Runs `f` over every item with at most `limit` calls in flight.
///
/// Results are written to the slot of their input index, so the output order
/// always matches the input order whatever order the calls finish in.
pub async fn bounded_fan_out<I, T, F, Fut>(items: Vec<I>, limit: usize, f: F) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T>,
{
    let total = items.len();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut completed = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let call = f(item);
            async move { (index, call.await) }
        })
        .buffer_unordered(limit.max(1));

    while let Some((index, result)) = completed.next().await {
        slots[index] = Some(result);
    }

    slots.into_iter().flatten().collect()
}

/// Merges sub-query results: first occurrence of each place id wins, then a
/// stable sort by descending score, then truncation to `max_results`.
///
/// `batches` must be in discovery order; ties keep that order.
pub fn merge_ranked_places<B>(batches: B, max_results: usize) -> Vec<PlaceResult>
where
    B: IntoIterator<Item = Vec<PlaceResult>>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<PlaceResult> = batches
        .into_iter()
        .flatten()
        .filter(|place| seen.insert(place.place_id.clone()))
        .collect();

    // sort_by is stable.
    merged.sort_by(|a, b| b.score().total_cmp(&a.score()));
    merged.truncate(max_results);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn place(id: &str, name: &str, rating: Option<f64>) -> PlaceResult {
        PlaceResult {
            place_id: id.to_string(),
            name: name.to_string(),
            rating,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_order_matches_input_order() {
        for n in [1usize, 2, 7, 50, 100] {
            let items: Vec<usize> = (0..n).collect();
            // Later items finish first.
            let out = bounded_fan_out(items, 5, |i| async move {
                tokio::time::sleep(Duration::from_millis((n - i) as u64)).await;
                i * 10
            })
            .await;
            assert_eq!(out, (0..n).map(|i| i * 10).collect::<Vec<_>>());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let out = bounded_fan_out((0..40).collect(), 5, |i: u32| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await;

        assert_eq!(out.len(), 40);
        assert_eq!(peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out: Vec<u8> = bounded_fan_out(Vec::<u8>::new(), 5, |i| async move { i }).await;
        assert!(out.is_empty());
    }

    #[test]
    fn test_dedup_keeps_first_seen_entry() {
        let merged = merge_ranked_places(
            vec![
                vec![place("a", "first a", Some(4.0)), place("b", "b", Some(3.0))],
                vec![place("a", "second a", Some(5.0)), place("c", "c", Some(4.5))],
            ],
            20,
        );

        let ids: Vec<_> = merged.iter().map(|p| p.place_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(merged[1].name, "first a");
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let merged = merge_ranked_places(
            vec![
                vec![place("x", "x", Some(4.0)), place("y", "y", None)],
                vec![place("z", "z", Some(4.0)), place("w", "w", Some(0.0))],
            ],
            20,
        );
        let ids: Vec<_> = merged.iter().map(|p| p.place_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "z", "y", "w"]);
    }

    #[test]
    fn test_truncates_after_ranking() {
        let batch: Vec<_> = (0..30)
            .map(|i| place(&format!("p{}", i), "p", Some(i as f64 / 10.0)))
            .collect();
        let merged = merge_ranked_places(vec![batch], 20);
        assert_eq!(merged.len(), 20);
        assert_eq!(merged[0].place_id, "p29");
        assert_eq!(merged[19].place_id, "p10");
    }
}
