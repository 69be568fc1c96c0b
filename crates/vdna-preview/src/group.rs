//! Segment grouping by accumulated duration.
//!
//! A preview clip must cover a minimum playable length, so segments are
//! grouped by the time they add up to rather than by count. The group at
//! index `i` is always the prefix `segments[..=i]`.

use serde::Serialize;
use vdna_models::timeframe::span_end_or_fallback;
use vdna_models::{Script, ScriptSegment};

use crate::reconcile::compute_group_identity;

/// Accumulated seconds at which a group becomes previewable.
pub const READY_THRESHOLD_SECS: u32 = 15;

/// Sum of the span end offsets of `segments[..=upto_inclusive]`.
///
/// Unparsable timeframes contribute the 15 second fallback. An index past
/// the end is clamped to the last segment.
pub fn accumulated_duration(segments: &[ScriptSegment], upto_inclusive: usize) -> u32 {
    resolve_group_boundary(segments, upto_inclusive)
        .iter()
        .map(|segment| span_end_or_fallback(&segment.timeframe))
        .fold(0u32, u32::saturating_add)
}

/// True once the prefix ending at `index` reaches [`READY_THRESHOLD_SECS`].
pub fn is_group_ready(segments: &[ScriptSegment], index: usize) -> bool {
    !segments.is_empty() && accumulated_duration(segments, index) >= READY_THRESHOLD_SECS
}

/// Segments submitted together for a preview at `index`.
pub fn resolve_group_boundary(segments: &[ScriptSegment], index: usize) -> &[ScriptSegment] {
    if segments.is_empty() {
        return segments;
    }
    let last = index.min(segments.len() - 1);
    &segments[..=last]
}

/// Contiguous run of segments rendered as one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentGroup {
    script_id: String,
    member_segment_ids: Vec<String>,
    shared_task_id: Option<String>,
}

impl SegmentGroup {
    /// Group over explicit members. Identity is unknown until refreshed.
    pub fn new<I, S>(script_id: impl Into<String>, member_segment_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script_id: script_id.into(),
            member_segment_ids: member_segment_ids.into_iter().map(Into::into).collect(),
            shared_task_id: None,
        }
    }

    /// Group ending at `index` of `script`, with its identity derived from
    /// the members' stored task ids. None if `index` is out of range.
    pub fn resolve(script: &Script, index: usize) -> Option<Self> {
        if index >= script.len() {
            return None;
        }
        let members = resolve_group_boundary(&script.segments, index)
            .iter()
            .map(|segment| segment.id.clone());
        let mut group = Self::new(script.script_id.clone(), members);
        group.refresh_identity(script);
        Some(group)
    }

    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    pub fn member_segment_ids(&self) -> &[String] {
        &self.member_segment_ids
    }

    /// The only segment id sent with a submission.
    pub fn leading_segment_id(&self) -> Option<&str> {
        self.member_segment_ids.first().map(String::as_str)
    }

    pub fn last_segment_id(&self) -> Option<&str> {
        self.member_segment_ids.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.member_segment_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_segment_ids.is_empty()
    }

    pub fn contains(&self, segment_id: &str) -> bool {
        self.member_segment_ids.iter().any(|id| id == segment_id)
    }

    /// Task id shared by every member that has one, as of the last refresh.
    pub fn shared_task_id(&self) -> Option<&str> {
        self.shared_task_id.as_deref()
    }

    /// Re-derive the shared task id from the current state of `script`.
    pub fn refresh_identity(&mut self, script: &Script) {
        self.shared_task_id = compute_group_identity(script, self);
    }

    /// Accumulated duration of the members as currently stored in `script`.
    pub fn accumulated_duration_seconds(&self, script: &Script) -> u32 {
        self.member_segment_ids
            .iter()
            .map(|id| {
                script
                    .segment(id)
                    .map(|segment| span_end_or_fallback(&segment.timeframe))
                    .unwrap_or(vdna_models::FALLBACK_SPAN_SECS)
            })
            .fold(0u32, u32::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdna_models::SegmentMedia;

    fn segments(timeframes: &[&str]) -> Vec<ScriptSegment> {
        timeframes
            .iter()
            .enumerate()
            .map(|(i, tf)| ScriptSegment::new(format!("seg-{}", i), *tf))
            .collect()
    }

    #[test]
    fn test_accumulates_end_offsets() {
        let segs = segments(&["0:00-0:10", "0:10-0:20"]);
        assert_eq!(accumulated_duration(&segs, 0), 10);
        assert_eq!(accumulated_duration(&segs, 1), 30);
        // clamped past the end
        assert_eq!(accumulated_duration(&segs, 9), 30);
    }

    #[test]
    fn test_unparsable_contributes_fallback() {
        let segs = segments(&["intro", "5s"]);
        assert_eq!(accumulated_duration(&segs, 0), 15);
        assert_eq!(accumulated_duration(&segs, 0), 15);
        assert_eq!(accumulated_duration(&segs, 1), 20);
    }

    #[test]
    fn test_group_ready_threshold() {
        let segs = segments(&["0:00-0:10", "0:10-0:20"]);
        assert!(!is_group_ready(&segs, 0));
        assert!(is_group_ready(&segs, 1));
        assert!(!is_group_ready(&[], 0));
    }

    #[test]
    fn test_readiness_is_monotonic() {
        let segs = segments(&["3s", "0:00-0:05", "???", "0s", "0:00-0:01", "2s"]);
        let mut seen_ready = false;
        for i in 0..segs.len() + 2 {
            let ready = is_group_ready(&segs, i);
            assert!(!seen_ready || ready, "readiness regressed at index {}", i);
            seen_ready |= ready;
        }
        assert!(seen_ready);
    }

    #[test]
    fn test_boundary_is_inclusive_prefix() {
        let segs = segments(&["1s", "2s", "3s"]);
        let ids: Vec<_> = resolve_group_boundary(&segs, 1)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["seg-0", "seg-1"]);
        assert!(resolve_group_boundary(&[], 3).is_empty());
    }

    #[test]
    fn test_resolve_group_from_script() {
        let mut media = SegmentMedia::idle();
        media.begin_video("t-1", "sora-2-text-to-video");
        let script = Script::new("sc-1", "Coffee")
            .with_segment(ScriptSegment::new("a", "0:00-0:10").with_media(media.clone()))
            .with_segment(ScriptSegment::new("b", "0:10-0:20").with_media(media))
            .with_segment(ScriptSegment::new("c", "0:20-0:30"));

        let group = SegmentGroup::resolve(&script, 1).unwrap();
        assert_eq!(group.script_id(), "sc-1");
        assert_eq!(group.member_segment_ids(), ["a", "b"]);
        assert_eq!(group.leading_segment_id(), Some("a"));
        assert_eq!(group.shared_task_id(), Some("t-1"));
        assert_eq!(group.accumulated_duration_seconds(&script), 30);

        assert!(SegmentGroup::resolve(&script, 3).is_none());
    }

    #[test]
    fn test_new_group_has_no_identity() {
        let group = SegmentGroup::new("sc-1", ["a", "b"]);
        assert_eq!(group.len(), 2);
        assert!(group.contains("b"));
        assert!(group.shared_task_id().is_none());
        assert!(SegmentGroup::new("sc-1", Vec::<String>::new()).is_empty());
    }
}
