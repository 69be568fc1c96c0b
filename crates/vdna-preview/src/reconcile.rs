//! Attaching task results to the segments of a group.
//!
//! A group's stored task id is only evidence of "this group's result" when
//! every member that carries one agrees. Any disagreement renders the group
//! as idle; a stale success is never shown.

use serde::Serialize;
use vdna_models::{MediaStatus, Script};

use crate::group::SegmentGroup;

/// Render state recovered from a script for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconciledVideo {
    /// The group's video is finished.
    Ready { video_url: String, task_id: String },
    /// A task is still running; the poller should attach to it.
    InFlight { task_id: String },
}

impl ReconciledVideo {
    pub fn task_id(&self) -> &str {
        match self {
            ReconciledVideo::Ready { task_id, .. } | ReconciledVideo::InFlight { task_id } => task_id,
        }
    }

    pub fn video_url(&self) -> Option<&str> {
        match self {
            ReconciledVideo::Ready { video_url, .. } => Some(video_url),
            ReconciledVideo::InFlight { .. } => None,
        }
    }
}

/// Successful result of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub task_id: String,
    pub video_url: String,
}

impl Settlement {
    pub fn new(task_id: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            video_url: video_url.into(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

/// Result of [`merge_settled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The settlement was written to `updated` member segments.
    Applied { updated: usize },
    /// Members no longer share the settled task id; nothing was written.
    StaleGroupIdentity,
}

/// The task id shared by the group's members, if unambiguous.
///
/// Members without a stored task id (or missing from `script`) are skipped.
/// Returns None when no member has one or when any two differ.
pub fn compute_group_identity(script: &Script, group: &SegmentGroup) -> Option<String> {
    if script.script_id != group.script_id() {
        return None;
    }

    let mut ids = group
        .member_segment_ids()
        .iter()
        .filter_map(|id| script.segment(id))
        .filter_map(|segment| segment.task_id());

    let first = ids.next()?;
    if ids.all(|id| id == first) {
        Some(first.to_string())
    } else {
        None
    }
}

/// Video state of a group, judged by its last member.
pub fn reconcile_video_info(script: &Script, group: &SegmentGroup) -> Option<ReconciledVideo> {
    let task_id = compute_group_identity(script, group)?;
    let last = script.segment(group.last_segment_id()?)?;

    match last.media_status() {
        MediaStatus::Done => last.video_url().map(|url| ReconciledVideo::Ready {
            video_url: url.to_string(),
            task_id,
        }),
        MediaStatus::GeneratingVideo => Some(ReconciledVideo::InFlight { task_id }),
        _ => None,
    }
}

/// Write a finished video into the in-memory script.
///
/// Only members whose stored task id equals the settled one are touched, and
/// nothing is written unless the group identity matches it.
pub fn merge_settled(script: &mut Script, group: &SegmentGroup, settled: &Settlement) -> MergeOutcome {
    if compute_group_identity(script, group).as_deref() != Some(settled.task_id()) {
        return MergeOutcome::StaleGroupIdentity;
    }

    let mut updated = 0;
    for id in group.member_segment_ids() {
        let Some(segment) = script.segment_mut(id) else {
            continue;
        };
        if segment.task_id() != Some(settled.task_id()) {
            continue;
        }
        segment.media_mut().complete_video(settled.video_url.clone());
        updated += 1;
    }

    MergeOutcome::Applied { updated }
}
