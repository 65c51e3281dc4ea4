//! Attendance recorder: validates record requests against zone policy and
//! owns the resulting records.

use crate::core::stats::{self, AttendanceStats, StatsPolicy};
use crate::core::zones::ZoneRegistry;
use crate::errors::{AppError, AppResult};
use crate::models::record::{AttendanceRecord, RecordRequest, ReviewStatus};
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Host-provided persistence for records. Every call happens before the
/// in-memory set changes, so a failing sink leaves the recorder untouched.
pub trait RecordSink: Send {
    fn persist(&mut self, record: &AttendanceRecord) -> AppResult<()>;
    fn update(&mut self, record: &AttendanceRecord) -> AppResult<()>;
    fn remove(&mut self, record_id: i64) -> AppResult<()>;
}

/// Sink that keeps nothing; the recorder's own set is the only copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn persist(&mut self, _record: &AttendanceRecord) -> AppResult<()> {
        Ok(())
    }
    fn update(&mut self, _record: &AttendanceRecord) -> AppResult<()> {
        Ok(())
    }
    fn remove(&mut self, _record_id: i64) -> AppResult<()> {
        Ok(())
    }
}

struct RecordSet {
    records: BTreeMap<i64, AttendanceRecord>,
    next_id: i64,
    sink: Box<dyn RecordSink>,
    last_as_of: Option<NaiveDateTime>,
}

impl RecordSet {
    fn all(&self) -> Vec<AttendanceRecord> {
        self.records.values().cloned().collect()
    }
}

pub struct AttendanceRecorder {
    registry: Arc<ZoneRegistry>,
    policy: StatsPolicy,
    inner: Mutex<RecordSet>,
    stats: watch::Sender<AttendanceStats>,
}

impl AttendanceRecorder {
    pub fn new(registry: Arc<ZoneRegistry>, policy: StatsPolicy) -> Self {
        let (stats, _) = watch::channel(AttendanceStats::empty());
        Self {
            registry,
            policy,
            inner: Mutex::new(RecordSet {
                records: BTreeMap::new(),
                next_id: 1,
                sink: Box::new(NullSink),
                last_as_of: None,
            }),
            stats,
        }
    }

    pub fn with_sink(self, sink: Box<dyn RecordSink>) -> Self {
        self.lock().sink = sink;
        self
    }

    fn lock(&self) -> MutexGuard<'_, RecordSet> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the record set with records read back from storage.
    pub fn load(&self, records: Vec<AttendanceRecord>, as_of: NaiveDateTime) {
        let mut set = self.lock();
        set.next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        set.records = records.into_iter().map(|r| (r.id, r)).collect();
        set.last_as_of = Some(as_of);
        self.publish(&set);
    }

    /// Validate `request` against zone policy and create a `Pending` record.
    ///
    /// Zone resolution, validation, the sink write and the append all happen
    /// while holding both the record lock and a registry read guard, so a
    /// concurrent zone edit cannot slip in between check and append. Nothing
    /// is written on any failure path.
    pub fn request_record(
        &self,
        request: RecordRequest,
        now: NaiveDateTime,
    ) -> AppResult<AttendanceRecord> {
        let mut set = self.lock();

        let outcome = self.registry.with_snapshot(|zones| -> AppResult<AttendanceRecord> {
            let zone = match request.zone_hint {
                Some(id) => zones.get(id).filter(|z| z.is_active),
                None => zones.nearest(request.coordinate).map(|(z, _)| z),
            }
            .ok_or(AppError::NoZoneFound)?;

            if !zone.permits(request.record_type) {
                return Err(AppError::RecordTypeNotAllowed {
                    record_type: request.record_type,
                    zone: zone.name.clone(),
                });
            }
            if !zone.working_hours.contains(now) {
                return Err(AppError::OutsideWorkingHours {
                    zone: zone.name.clone(),
                    at: now,
                });
            }

            let record = AttendanceRecord {
                id: set.next_id,
                user_id: request.user_id.clone(),
                record_type: request.record_type,
                occurred_at: now,
                zone_id: zone.id,
                coordinate: request.coordinate,
                accuracy: request.accuracy,
                review_status: ReviewStatus::Pending,
                photo_ref: request.photo_ref.clone(),
                notes: request.notes.clone(),
                review_note: None,
            };

            set.sink.persist(&record)?;
            set.next_id += 1;
            set.records.insert(record.id, record.clone());
            Ok(record)
        });

        let record = match outcome {
            Ok(r) => r,
            Err(e) => {
                tracing::info!(
                    user_id = %request.user_id,
                    record_type = %request.record_type,
                    error = %e,
                    "attendance request rejected"
                );
                return Err(e);
            }
        };

        tracing::info!(
            record_id = record.id,
            user_id = %record.user_id,
            zone_id = record.zone_id,
            record_type = %record.record_type,
            "attendance record created"
        );

        set.last_as_of = Some(now);
        self.publish(&set);
        Ok(record)
    }

    /// The single mutation point for an external reviewer.
    pub fn set_review_status(
        &self,
        record_id: i64,
        status: ReviewStatus,
        reviewer_note: Option<String>,
    ) -> AppResult<AttendanceRecord> {
        let mut set = self.lock();
        let current = set
            .records
            .get(&record_id)
            .ok_or(AppError::RecordNotFound(record_id))?;

        if !current.review_status.can_review_to(status) {
            return Err(AppError::InvalidReviewTransition {
                from: current.review_status,
                to: status,
            });
        }

        let mut updated = current.clone();
        updated.review_status = status;
        updated.review_note = reviewer_note;

        set.sink.update(&updated)?;
        set.records.insert(record_id, updated.clone());

        tracing::info!(record_id, status = %status, "review status changed");
        self.publish(&set);
        Ok(updated)
    }

    /// Policy approval: every pending record with `accuracy <= max_accuracy_m`
    /// becomes `AutoApproved`. Returns the ids that changed.
    pub fn auto_approve(&self, max_accuracy_m: f64) -> AppResult<Vec<i64>> {
        let mut set = self.lock();
        let candidates: Vec<AttendanceRecord> = set
            .records
            .values()
            .filter(|r| r.review_status.is_pending() && r.accuracy <= max_accuracy_m)
            .cloned()
            .collect();

        let mut changed = Vec::with_capacity(candidates.len());
        for mut r in candidates {
            r.review_status = ReviewStatus::AutoApproved;
            if let Err(e) = set.sink.update(&r) {
                // keep what was already persisted consistent with memory
                self.publish(&set);
                return Err(e);
            }
            changed.push(r.id);
            set.records.insert(r.id, r);
        }

        if !changed.is_empty() {
            tracing::info!(count = changed.len(), max_accuracy_m, "records auto-approved");
            self.publish(&set);
        }
        Ok(changed)
    }

    /// Policy approval for one record, used right after it is requested.
    /// Returns the updated record, or `None` if it is not pending or its
    /// accuracy exceeds the bound.
    pub fn auto_approve_record(
        &self,
        record_id: i64,
        max_accuracy_m: f64,
    ) -> AppResult<Option<AttendanceRecord>> {
        let mut set = self.lock();
        let current = set
            .records
            .get(&record_id)
            .ok_or(AppError::RecordNotFound(record_id))?;
        if !current.review_status.is_pending() || current.accuracy > max_accuracy_m {
            return Ok(None);
        }

        let mut updated = current.clone();
        updated.review_status = ReviewStatus::AutoApproved;
        set.sink.update(&updated)?;
        set.records.insert(record_id, updated.clone());

        tracing::info!(record_id, max_accuracy_m, "record auto-approved");
        self.publish(&set);
        Ok(Some(updated))
    }

    /// Administrative removal.
    pub fn delete(&self, record_id: i64) -> AppResult<AttendanceRecord> {
        let mut set = self.lock();
        if !set.records.contains_key(&record_id) {
            return Err(AppError::RecordNotFound(record_id));
        }

        set.sink.remove(record_id)?;
        let removed = set
            .records
            .remove(&record_id)
            .ok_or(AppError::RecordNotFound(record_id))?;

        tracing::info!(record_id, "attendance record deleted");
        self.publish(&set);
        Ok(removed)
    }

    pub fn get(&self, record_id: i64) -> Option<AttendanceRecord> {
        self.lock().records.get(&record_id).cloned()
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.lock().all()
    }

    pub fn records_for(&self, user_id: &str) -> Vec<AttendanceRecord> {
        self.lock()
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn policy(&self) -> &StatsPolicy {
        &self.policy
    }

    /// Stats as of the most recent mutation.
    pub fn stats(&self) -> AttendanceStats {
        self.stats.borrow().clone()
    }

    /// Receives a fresh [`AttendanceStats`] after every record mutation.
    pub fn subscribe_stats(&self) -> watch::Receiver<AttendanceStats> {
        self.stats.subscribe()
    }

    fn publish(&self, set: &RecordSet) {
        let as_of = set
            .last_as_of
            .unwrap_or_else(|| Local::now().naive_local());
        let fresh = stats::recompute(&set.all(), as_of, &self.policy);
        self.stats.send_replace(fresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::destination;
    use crate::models::coordinate::Coordinate;
    use crate::models::record_type::RecordType;
    use crate::models::zone::{WorkingHours, ZoneDraft, ZonePatch};
    use chrono::{NaiveDate, NaiveTime};

    const CENTER: Coordinate = Coordinate::new(13.7563, 100.5018);

    fn office() -> ZoneDraft {
        ZoneDraft {
            name: "Bangkok HQ".into(),
            center: CENTER,
            radius_meters: 100.0,
            is_active: true,
            permitted_record_types: [RecordType::CheckIn, RecordType::CheckOut]
                .into_iter()
                .collect(),
            working_hours: WorkingHours::weekdays(
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            ),
        }
    }

    fn setup() -> (Arc<ZoneRegistry>, AttendanceRecorder, i64) {
        let reg = Arc::new(ZoneRegistry::new());
        let id = reg.create(office()).unwrap();
        let rec = AttendanceRecorder::new(reg.clone(), StatsPolicy::default());
        (reg, rec, id)
    }

    fn tuesday(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn saturday(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 6)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn at_meters(m: f64) -> Coordinate {
        destination(CENTER, 0.0, m)
    }

    #[test]
    fn check_in_inside_zone_during_hours() {
        let (_, rec, zone_id) = setup();
        let r = rec
            .request_record(
                RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 8.0),
                tuesday(8, 15),
            )
            .unwrap();

        assert_eq!(r.review_status, ReviewStatus::Pending);
        assert_eq!(r.zone_id, zone_id);
        assert_eq!(r.occurred_at, tuesday(8, 15));
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.stats().total, 1);
    }

    #[test]
    fn outside_radius_is_no_zone_found() {
        let (_, rec, _) = setup();
        let err = rec
            .request_record(
                RecordRequest::new("alice", RecordType::CheckIn, at_meters(150.0), 8.0),
                tuesday(8, 15),
            )
            .unwrap_err();
        assert!(matches!(err, AppError::NoZoneFound));
        assert!(rec.is_empty());
    }

    #[test]
    fn break_start_not_permitted() {
        let (_, rec, _) = setup();
        let err = rec
            .request_record(
                RecordRequest::new("alice", RecordType::BreakStart, at_meters(30.0), 8.0),
                tuesday(12, 0),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::RecordTypeNotAllowed {
                record_type: RecordType::BreakStart,
                ..
            }
        ));
        assert!(rec.is_empty());
    }

    #[test]
    fn saturday_is_outside_working_hours() {
        let (_, rec, _) = setup();
        let err = rec
            .request_record(
                RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 8.0),
                saturday(8, 15),
            )
            .unwrap_err();
        assert!(matches!(err, AppError::OutsideWorkingHours { .. }));
    }

    #[test]
    fn failures_leave_records_and_stats_unchanged() {
        let (_, rec, _) = setup();
        rec.request_record(
            RecordRequest::new("alice", RecordType::CheckIn, at_meters(10.0), 8.0),
            tuesday(8, 0),
        )
        .unwrap();
        let before_stats = rec.stats();
        let before_len = rec.len();

        let attempts = [
            (RecordType::CheckIn, at_meters(500.0), tuesday(9, 0)),
            (RecordType::OvertimeStart, at_meters(10.0), tuesday(9, 0)),
            (RecordType::CheckOut, at_meters(10.0), tuesday(19, 0)),
        ];
        for (kind, pos, now) in attempts {
            assert!(
                rec.request_record(RecordRequest::new("alice", kind, pos, 8.0), now)
                    .is_err()
            );
        }

        assert_eq!(rec.len(), before_len);
        assert_eq!(rec.stats(), before_stats);
    }

    #[test]
    fn zone_hint_must_be_known_and_active() {
        let (reg, rec, zone_id) = setup();
        let req = RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 8.0);

        let err = rec
            .request_record(req.clone().with_zone(99), tuesday(8, 15))
            .unwrap_err();
        assert!(matches!(err, AppError::NoZoneFound));

        reg.update(
            zone_id,
            ZonePatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(
            rec.request_record(req.clone().with_zone(zone_id), tuesday(8, 15)),
            Err(AppError::NoZoneFound)
        ));
        // and the nearest-zone lookup skips it too
        assert!(matches!(
            rec.request_record(req, tuesday(8, 15)),
            Err(AppError::NoZoneFound)
        ));
    }

    #[test]
    fn identical_requests_create_distinct_records() {
        let (_, rec, _) = setup();
        let req = RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 8.0)
            .with_notes("front gate")
            .with_photo("photos/alice-0815.jpg");
        let a = rec.request_record(req.clone(), tuesday(8, 15)).unwrap();
        let b = rec.request_record(req, tuesday(8, 15)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(b.notes.as_deref(), Some("front gate"));
        assert_eq!(rec.records_for("alice").len(), 2);
    }

    #[test]
    fn review_transitions() {
        let (_, rec, _) = setup();
        let r = rec
            .request_record(
                RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 8.0),
                tuesday(8, 15),
            )
            .unwrap();

        let approved = rec
            .set_review_status(r.id, ReviewStatus::Approved, Some("ok".into()))
            .unwrap();
        assert_eq!(approved.review_status, ReviewStatus::Approved);
        assert_eq!(approved.review_note.as_deref(), Some("ok"));
        assert_eq!(rec.stats().pending_review, 0);

        let err = rec
            .set_review_status(r.id, ReviewStatus::Rejected, None)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReviewTransition { .. }));
        assert!(matches!(
            rec.set_review_status(77, ReviewStatus::Approved, None),
            Err(AppError::RecordNotFound(77))
        ));
    }

    #[test]
    fn auto_approve_respects_accuracy_bound() {
        let (_, rec, _) = setup();
        let precise = rec
            .request_record(
                RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 5.0),
                tuesday(8, 15),
            )
            .unwrap();
        let fuzzy = rec
            .request_record(
                RecordRequest::new("bob", RecordType::CheckIn, at_meters(30.0), 60.0),
                tuesday(8, 20),
            )
            .unwrap();

        assert_eq!(rec.auto_approve(20.0).unwrap(), vec![precise.id]);
        assert_eq!(
            rec.get(precise.id).unwrap().review_status,
            ReviewStatus::AutoApproved
        );
        assert!(rec.get(fuzzy.id).unwrap().review_status.is_pending());
        assert!(rec.auto_approve(20.0).unwrap().is_empty());
    }

    #[test]
    fn auto_approve_record_touches_only_that_record() {
        let (_, rec, _) = setup();
        let bobs = rec
            .request_record(
                RecordRequest::new("bob", RecordType::CheckIn, at_meters(30.0), 5.0),
                tuesday(8, 5),
            )
            .unwrap();
        let alices = rec
            .request_record(
                RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 5.0),
                tuesday(8, 15),
            )
            .unwrap();

        let approved = rec.auto_approve_record(alices.id, 20.0).unwrap().unwrap();
        assert_eq!(approved.review_status, ReviewStatus::AutoApproved);
        assert!(rec.get(bobs.id).unwrap().review_status.is_pending());
        assert_eq!(rec.stats().pending_review, 1);

        // already decided, and over the bound: both left alone
        assert!(rec.auto_approve_record(alices.id, 20.0).unwrap().is_none());
        assert!(rec.auto_approve_record(bobs.id, 1.0).unwrap().is_none());
        assert!(matches!(
            rec.auto_approve_record(99, 20.0),
            Err(AppError::RecordNotFound(99))
        ));
    }

    #[test]
    fn stats_subscribers_see_every_mutation() {
        let (_, rec, _) = setup();
        let mut rx = rec.subscribe_stats();

        let r = rec
            .request_record(
                RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 5.0),
                tuesday(8, 15),
            )
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().total, 1);

        rec.delete(r.id).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().total, 0);
        assert!(matches!(rec.delete(r.id), Err(AppError::RecordNotFound(_))));
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn persist(&mut self, _record: &AttendanceRecord) -> AppResult<()> {
            Err(AppError::Other("disk full".into()))
        }
        fn update(&mut self, _record: &AttendanceRecord) -> AppResult<()> {
            Err(AppError::Other("disk full".into()))
        }
        fn remove(&mut self, _record_id: i64) -> AppResult<()> {
            Err(AppError::Other("disk full".into()))
        }
    }

    #[test]
    fn sink_failure_is_not_a_partial_write() {
        let (reg, _, _) = setup();
        let rec = AttendanceRecorder::new(reg, StatsPolicy::default())
            .with_sink(Box::new(FailingSink));

        assert!(
            rec.request_record(
                RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 5.0),
                tuesday(8, 15),
            )
            .is_err()
        );
        assert!(rec.is_empty());
    }

    #[test]
    fn load_continues_numbering() {
        let (_, rec, _) = setup();
        let r = rec
            .request_record(
                RecordRequest::new("alice", RecordType::CheckIn, at_meters(30.0), 5.0),
                tuesday(8, 15),
            )
            .unwrap();
        let mut stored = r.clone();
        stored.id = 10;

        let (_, fresh, _) = setup();
        fresh.load(vec![stored], tuesday(9, 0));
        let next = fresh
            .request_record(
                RecordRequest::new("alice", RecordType::CheckOut, at_meters(30.0), 5.0),
                tuesday(16, 0),
            )
            .unwrap();
        assert_eq!(next.id, 11);
        assert_eq!(fresh.stats().total, 2);
    }
}
