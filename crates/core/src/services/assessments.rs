//! EWS Assessment Tracker.
//!
//! Keeps the append-only history of early warning score assessments for each visit and
//! projects the "current" risk level at read time.
//!
//! ## Precedence
//!
//! Assessments are ranked by type first (`VERIFIED` before `PROVISIONAL`) and then by
//! creation time, most recent first. A nurse-verified level therefore outranks any kiosk
//! estimate, however recent. Records that tie on both keys rank the later append first.
//!
//! Recording an assessment never changes visit status; callers decide whether a new level
//! should trigger a transition.

use super::{bounded, require_actor};
use crate::config::CoreConfig;
use crate::records::EwsAssessment;
use crate::store::VisitStore;
use crate::{TriageError, TriageResult};
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::Arc;
use triage_types::{AssessmentType, EwsLevel, NonEmptyText};
use uuid::Uuid;

/// Validated input for a new assessment.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAssessment {
    pub assessment_type: AssessmentType,
    pub score: Option<u32>,
    pub level: EwsLevel,
    pub flags: Vec<String>,
    pub created_by: NonEmptyText,
}

impl NewAssessment {
    /// Build a `NewAssessment` from raw transport values.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidInput` if:
    /// - the type is not `PROVISIONAL` or `VERIFIED`,
    /// - the level is not one of the four defined levels,
    /// - the score is negative,
    /// - any flag is blank,
    /// - the creator reference is blank.
    pub fn parse(
        assessment_type: &str,
        score: Option<i64>,
        level: &str,
        flags: Vec<String>,
        created_by: &str,
    ) -> TriageResult<Self> {
        let assessment_type = assessment_type.parse::<AssessmentType>()?;
        let level = level.parse::<EwsLevel>()?;
        let score = score
            .map(|s| {
                u32::try_from(s).map_err(|_| {
                    TriageError::InvalidInput("score must be a non-negative integer".into())
                })
            })
            .transpose()?;
        let flags = flags
            .into_iter()
            .map(|flag| {
                let flag = flag.trim().to_string();
                if flag.is_empty() {
                    Err(TriageError::InvalidInput("flags cannot be blank".into()))
                } else {
                    Ok(flag)
                }
            })
            .collect::<TriageResult<Vec<_>>>()?;

        Ok(Self {
            assessment_type,
            score,
            level,
            flags,
            created_by: require_actor(created_by)?,
        })
    }
}

/// Precedence comparison: the assessment that should be shown first compares as `Less`.
fn precedence(a: &EwsAssessment, b: &EwsAssessment) -> Ordering {
    b.assessment_type
        .cmp(&a.assessment_type)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Order a visit's assessments by precedence.
///
/// `assessments` must be in append order, as returned by the store.
pub fn rank_assessments(mut assessments: Vec<EwsAssessment>) -> Vec<EwsAssessment> {
    // Stable sort over the reversed list puts later appends first among exact ties.
    assessments.reverse();
    assessments.sort_by(precedence);
    assessments
}

/// The highest-ranked assessment, without allocating a sorted copy.
pub fn most_relevant(assessments: &[EwsAssessment]) -> Option<&EwsAssessment> {
    assessments
        .iter()
        .rev()
        .min_by(|a, b| precedence(a, b))
}

#[derive(Clone)]
pub struct AssessmentTracker {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn VisitStore>,
}

impl AssessmentTracker {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn VisitStore>) -> Self {
        Self { cfg, store }
    }

    /// Append an immutable assessment for an existing visit.
    pub async fn record_assessment(
        &self,
        visit_id: Uuid,
        new: NewAssessment,
    ) -> TriageResult<EwsAssessment> {
        self.ensure_visit(visit_id).await?;

        let record = EwsAssessment {
            id: Uuid::new_v4(),
            visit_id,
            assessment_type: new.assessment_type,
            score: new.score,
            level: new.level,
            flags: new.flags,
            created_by: new.created_by,
            created_at: Utc::now(),
        };

        bounded(
            self.cfg.store_timeout(),
            "append_assessment",
            self.store.append_assessment(record.clone()),
        )
        .await?;

        tracing::info!(
            visit_id = %visit_id,
            assessment_type = %record.assessment_type,
            level = %record.level,
            "EWS assessment recorded"
        );
        Ok(record)
    }

    /// All assessments for a visit, highest precedence first.
    ///
    /// A visit with no assessments yields an empty list; an unknown visit is `NotFound`.
    pub async fn list_assessments(&self, visit_id: Uuid) -> TriageResult<Vec<EwsAssessment>> {
        self.ensure_visit(visit_id).await?;
        let assessments = bounded(
            self.cfg.store_timeout(),
            "list_assessments_for_visit",
            self.store.list_assessments_for_visit(visit_id),
        )
        .await?;
        Ok(rank_assessments(assessments))
    }

    /// The assessment that currently defines the visit's risk level, if any.
    pub async fn latest_assessment(&self, visit_id: Uuid) -> TriageResult<Option<EwsAssessment>> {
        Ok(self.list_assessments(visit_id).await?.into_iter().next())
    }

    async fn ensure_visit(&self, visit_id: Uuid) -> TriageResult<()> {
        bounded(
            self.cfg.store_timeout(),
            "get_visit",
            self.store.get_visit(visit_id),
        )
        .await?
        .map(|_| ())
        .ok_or(TriageError::NotFound("visit"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryVisitStore;
    use crate::test_support::{test_config, visit};
    use crate::ErrorKind;
    use chrono::{DateTime, Duration};
    use triage_types::{ArrivalPath, VisitStatus};

    async fn tracker_with_visit() -> (Arc<InMemoryVisitStore>, AssessmentTracker, Uuid) {
        let store = Arc::new(InMemoryVisitStore::new());
        let v = visit(Utc::now(), ArrivalPath::WalkIn, VisitStatus::Waiting);
        store.insert_visit(v.clone()).await.unwrap();
        let tracker = AssessmentTracker::new(test_config(), store.clone());
        (store, tracker, v.id)
    }

    fn assessment(
        visit_id: Uuid,
        assessment_type: AssessmentType,
        level: EwsLevel,
        created_at: DateTime<Utc>,
    ) -> EwsAssessment {
        EwsAssessment {
            id: Uuid::new_v4(),
            visit_id,
            assessment_type,
            score: None,
            level,
            flags: vec![],
            created_by: NonEmptyText::new("kiosk-1").unwrap(),
            created_at,
        }
    }

    #[tokio::test]
    async fn no_assessments_means_no_latest() {
        let (_store, tracker, visit_id) = tracker_with_visit().await;
        assert!(tracker.list_assessments(visit_id).await.unwrap().is_empty());
        assert_eq!(tracker.latest_assessment(visit_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn verified_wins_even_when_provisional_is_newer() {
        let (store, tracker, visit_id) = tracker_with_visit().await;
        let t0 = Utc::now();
        let verified = assessment(visit_id, AssessmentType::Verified, EwsLevel::Moderate, t0);
        let provisional = assessment(
            visit_id,
            AssessmentType::Provisional,
            EwsLevel::Critical,
            t0 + Duration::minutes(30),
        );
        store.append_assessment(verified.clone()).await.unwrap();
        store.append_assessment(provisional.clone()).await.unwrap();

        let latest = tracker.latest_assessment(visit_id).await.unwrap();
        assert_eq!(latest, Some(verified.clone()));

        let listed = tracker.list_assessments(visit_id).await.unwrap();
        assert_eq!(listed, vec![verified, provisional]);
    }

    #[tokio::test]
    async fn verified_wins_when_recorded_after_provisional() {
        let (_store, tracker, visit_id) = tracker_with_visit().await;
        tracker
            .record_assessment(
                visit_id,
                NewAssessment::parse("PROVISIONAL", None, "HIGH", vec![], "kiosk-1").unwrap(),
            )
            .await
            .unwrap();
        let verified = tracker
            .record_assessment(
                visit_id,
                NewAssessment::parse("VERIFIED", Some(3), "LOW", vec![], "rn-4").unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            tracker.latest_assessment(visit_id).await.unwrap(),
            Some(verified)
        );
    }

    #[tokio::test]
    async fn most_recent_verified_wins() {
        let (store, tracker, visit_id) = tracker_with_visit().await;
        let t1 = Utc::now() - Duration::hours(1);
        let t2 = t1 + Duration::minutes(45);
        let later = assessment(visit_id, AssessmentType::Verified, EwsLevel::Critical, t2);
        let earlier = assessment(visit_id, AssessmentType::Verified, EwsLevel::Low, t1);
        // Append out of chronological order to prove ranking uses timestamps.
        store.append_assessment(later.clone()).await.unwrap();
        store.append_assessment(earlier.clone()).await.unwrap();

        assert_eq!(
            tracker.latest_assessment(visit_id).await.unwrap(),
            Some(later)
        );
    }

    #[tokio::test]
    async fn provisional_only_visit_still_has_latest() {
        let (_store, tracker, visit_id) = tracker_with_visit().await;
        let provisional = tracker
            .record_assessment(
                visit_id,
                NewAssessment::parse(
                    "provisional",
                    None,
                    "moderate",
                    vec!["chest pain".into()],
                    "kiosk-2",
                )
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            tracker.latest_assessment(visit_id).await.unwrap(),
            Some(provisional)
        );
    }

    #[tokio::test]
    async fn record_for_unknown_visit_is_not_found() {
        let (_store, tracker, _visit_id) = tracker_with_visit().await;
        let new = NewAssessment::parse("VERIFIED", Some(5), "HIGH", vec![], "rn-1").unwrap();
        let err = tracker
            .record_assessment(Uuid::new_v4(), new)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = tracker.list_assessments(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_on_one_visit_are_all_kept() {
        let (_store, tracker, visit_id) = tracker_with_visit().await;

        let mut handles = Vec::new();
        for n in 0..24i64 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                let kind = if n % 2 == 0 { "VERIFIED" } else { "PROVISIONAL" };
                let creator = format!("rn-{n}");
                let new = NewAssessment::parse(kind, Some(n), "MODERATE", vec![], &creator)?;
                tracker.record_assessment(visit_id, new).await
            }));
        }

        let mut recorded = std::collections::HashSet::new();
        for handle in handles {
            recorded.insert(handle.await.unwrap().unwrap().id);
        }
        assert_eq!(recorded.len(), 24);

        let listed = tracker.list_assessments(visit_id).await.unwrap();
        assert_eq!(listed.len(), 24);
        let listed_ids: std::collections::HashSet<_> = listed.iter().map(|a| a.id).collect();
        assert_eq!(listed_ids, recorded);

        for pair in listed.windows(2) {
            assert_ne!(precedence(&pair[0], &pair[1]), Ordering::Greater);
        }
        assert!(listed[..12]
            .iter()
            .all(|a| a.assessment_type == AssessmentType::Verified));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        let cases = [
            NewAssessment::parse("CONFIRMED", None, "HIGH", vec![], "rn-1"),
            NewAssessment::parse("VERIFIED", None, "SEVERE", vec![], "rn-1"),
            NewAssessment::parse("VERIFIED", Some(-1), "HIGH", vec![], "rn-1"),
            NewAssessment::parse("VERIFIED", None, "HIGH", vec![" ".into()], "rn-1"),
            NewAssessment::parse("VERIFIED", None, "HIGH", vec![], ""),
        ];
        for case in cases {
            let err = case.expect_err("malformed assessment must be rejected");
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn exact_ties_rank_later_append_first() {
        let visit_id = Uuid::new_v4();
        let at = Utc::now();
        let first = assessment(visit_id, AssessmentType::Verified, EwsLevel::Low, at);
        let second = assessment(visit_id, AssessmentType::Verified, EwsLevel::High, at);
        let appended = vec![first.clone(), second.clone()];

        assert_eq!(most_relevant(&appended), Some(&second));
        assert_eq!(rank_assessments(appended), vec![second, first]);
    }
}
