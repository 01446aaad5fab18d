//! Incremental history merge.
//!
//! The server answers `get` with a fixed-size window whose leading entries
//! may be placeholders. Merging appends the fresh part of the window to the
//! retained history and keeps the last `window.len()` buckets.

use crate::control::protocol::{Bucket, InterfaceSegment, InterfaceSnapshot, SegmentMap};
use std::collections::BTreeMap;

/// Merge a server window into retained history.
///
/// - Placeholders are dropped.
/// - Buckets not newer than the last retained timestamp are skipped.
/// - An all-placeholder window leaves `previous` unchanged.
/// - The result holds at most `window.len()` buckets (the newest ones).
pub fn merge_history(previous: &[Bucket], window: Vec<Option<Bucket>>) -> Vec<Bucket> {
    let window_len = window.len();
    let Some(first) = window.iter().position(Option::is_some) else {
        return previous.to_vec();
    };

    let mut history = Vec::with_capacity(previous.len() + window_len - first);
    history.extend_from_slice(previous);

    for bucket in window.into_iter().skip(first).flatten() {
        if history
            .last()
            .is_some_and(|last: &Bucket| bucket.timestamp <= last.timestamp)
        {
            continue;
        }
        history.push(bucket);
    }

    if history.len() > window_len {
        history.drain(..history.len() - window_len);
    }
    history
}

/// Merge one interface's segment into its previous snapshot.
///
/// `closed` and `mac` follow the server. A snapshot closed locally is
/// returned unchanged until the server reports the interface closed too.
pub fn merge_snapshot(previous: Option<&InterfaceSnapshot>, segment: InterfaceSegment) -> InterfaceSnapshot {
    match previous {
        Some(prev) if prev.close_pending && !segment.closed => prev.clone(),
        Some(prev) => InterfaceSnapshot {
            history: merge_history(&prev.history, segment.history),
            closed: segment.closed,
            mac: segment.mac.or_else(|| prev.mac.clone()),
            close_pending: false,
        },
        None => InterfaceSnapshot {
            history: merge_history(&[], segment.history),
            closed: segment.closed,
            mac: segment.mac,
            close_pending: false,
        },
    }
}

/// Build the next data set from a server response.
///
/// The result is keyed by the response, except that snapshots still waiting
/// for their first bucket (fresh optimistic listens) survive a response that
/// does not mention them yet.
pub fn merge_response(
    current: &BTreeMap<String, InterfaceSnapshot>,
    response: SegmentMap,
) -> BTreeMap<String, InterfaceSnapshot> {
    let mut next: BTreeMap<String, InterfaceSnapshot> = response
        .into_iter()
        .map(|(name, segment)| {
            let merged = merge_snapshot(current.get(&name), segment);
            (name, merged)
        })
        .collect();

    for (name, snapshot) in current {
        if snapshot.history.is_empty() && !snapshot.closed && !next.contains_key(name) {
            next.insert(name.clone(), snapshot.clone());
        }
    }
    next
}

/// Latest retained timestamp for every interface with history.
pub fn latest_timestamps(data: &BTreeMap<String, InterfaceSnapshot>) -> BTreeMap<String, u64> {
    data.iter()
        .filter_map(|(name, snapshot)| Some((name.clone(), snapshot.latest_timestamp()?)))
        .collect()
}
