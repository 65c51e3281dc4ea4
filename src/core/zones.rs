//! Zone registry: the set of geofences and the spatial queries over it.

use crate::errors::{AppError, AppResult};
use crate::models::coordinate::Coordinate;
use crate::models::zone::{Zone, ZoneDraft, ZonePatch};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct ZoneSet {
    zones: BTreeMap<i64, Zone>,
    next_id: i64,
}

impl Default for ZoneSet {
    fn default() -> Self {
        Self {
            zones: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Read-only view of the zone set, valid while the registry's read guard is held.
pub struct ZoneSnapshot<'a> {
    zones: &'a BTreeMap<i64, Zone>,
}

impl<'a> ZoneSnapshot<'a> {
    pub fn get(&self, id: i64) -> Option<&'a Zone> {
        self.zones.get(&id)
    }

    pub fn active(&self) -> impl Iterator<Item = &'a Zone> + 'a {
        self.zones.values().filter(|z| z.is_active)
    }

    /// Active zones containing `point`, nearest first, with their distance.
    pub fn containing(&self, point: Coordinate) -> Vec<(&'a Zone, f64)> {
        let mut hits: Vec<(&Zone, f64)> = self
            .active()
            .map(|z| (z, z.distance_to(point)))
            .filter(|(z, d)| *d <= z.radius_meters)
            .collect();
        // stable sort: equal distances stay in id order
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits
    }

    pub fn nearest(&self, point: Coordinate) -> Option<(&'a Zone, f64)> {
        self.containing(point).into_iter().next()
    }
}

/// Owns the zone set. Reads hand out clones; writes go through `create`,
/// `update` and `delete`, each validated before the set is touched.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    inner: RwLock<ZoneSet>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ZoneSet> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ZoneSet> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole set with zones coming from storage, keeping their ids.
    /// New ids continue after `high_water`, the largest id ever issued, so a
    /// deleted zone's id is never handed out again.
    /// Nothing is replaced if any zone is invalid.
    pub fn load(&self, zones: Vec<Zone>, high_water: i64) -> AppResult<()> {
        for z in &zones {
            z.validate()
                .map_err(|e| AppError::InvalidZone(format!("stored zone {}: {e}", z.id)))?;
        }

        let mut set = self.write();
        let max_id = zones.iter().map(|z| z.id).max().unwrap_or(0);
        set.next_id = max_id.max(high_water) + 1;
        set.zones = zones.into_iter().map(|z| (z.id, z)).collect();

        tracing::debug!(count = set.zones.len(), "zone registry loaded");
        Ok(())
    }

    pub fn create(&self, draft: ZoneDraft) -> AppResult<i64> {
        let mut set = self.write();
        let id = set.next_id;
        let zone = draft.into_zone(id);
        zone.validate()?;

        tracing::info!(
            zone_id = id,
            name = %zone.name,
            radius = zone.radius_meters,
            "zone created"
        );
        set.zones.insert(id, zone);
        set.next_id += 1;
        Ok(id)
    }

    /// Apply a partial update. Unknown ids and invalid results leave the set unchanged.
    pub fn update(&self, id: i64, patch: ZonePatch) -> AppResult<Zone> {
        let mut set = self.write();
        let current = set.zones.get(&id).ok_or(AppError::ZoneNotFound(id))?;

        let updated = patch.apply(current);
        updated.validate()?;

        tracing::info!(zone_id = id, active = updated.is_active, "zone updated");
        set.zones.insert(id, updated.clone());
        Ok(updated)
    }

    pub fn delete(&self, id: i64) -> AppResult<Zone> {
        let removed = self.write().zones.remove(&id).ok_or(AppError::ZoneNotFound(id))?;
        tracing::info!(zone_id = id, name = %removed.name, "zone deleted");
        Ok(removed)
    }

    pub fn get(&self, id: i64) -> Option<Zone> {
        self.read().zones.get(&id).cloned()
    }

    pub fn list(&self) -> Vec<Zone> {
        self.read().zones.values().cloned().collect()
    }

    pub fn list_active(&self) -> Vec<Zone> {
        self.read()
            .zones
            .values()
            .filter(|z| z.is_active)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All active zones whose membership test holds for `point`, nearest first.
    pub fn find_containing(&self, point: Coordinate) -> Vec<Zone> {
        self.with_snapshot(|s| {
            s.containing(point)
                .into_iter()
                .map(|(z, _)| z.clone())
                .collect()
        })
    }

    /// Nearest active zone that actually contains `point`.
    pub fn find_nearest(&self, point: Coordinate) -> Option<(Zone, f64)> {
        self.with_snapshot(|s| s.nearest(point).map(|(z, d)| (z.clone(), d)))
    }

    /// Run `f` against a consistent view of the set. Writers are blocked
    /// until `f` returns.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&ZoneSnapshot<'_>) -> R) -> R {
        let set = self.read();
        let snapshot = ZoneSnapshot { zones: &set.zones };
        f(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::{destination, distance_meters};
    use crate::models::record_type::RecordType;
    use crate::models::zone::WorkingHours;
    use chrono::NaiveTime;

    const CENTER: Coordinate = Coordinate::new(13.7563, 100.5018);

    fn draft(name: &str, center: Coordinate, radius: f64) -> ZoneDraft {
        ZoneDraft {
            name: name.into(),
            center,
            radius_meters: radius,
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

    #[test]
    fn create_assigns_sequential_ids() {
        let reg = ZoneRegistry::new();
        let a = reg.create(draft("A", CENTER, 100.0)).unwrap();
        let b = reg.create(draft("B", CENTER, 50.0)).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(reg.get(b).unwrap().name, "B");
    }

    #[test]
    fn create_rejects_non_positive_radius() {
        let reg = ZoneRegistry::new();
        for r in [0.0, -5.0, f64::NAN] {
            let err = reg.create(draft("bad", CENTER, r)).unwrap_err();
            assert!(matches!(err, AppError::InvalidZone(_)));
        }
        assert!(reg.is_empty());
    }

    #[test]
    fn update_and_delete_unknown_ids() {
        let reg = ZoneRegistry::new();
        reg.create(draft("A", CENTER, 100.0)).unwrap();

        let err = reg.update(42, ZonePatch::default()).unwrap_err();
        assert!(matches!(err, AppError::ZoneNotFound(42)));
        assert!(matches!(reg.delete(42), Err(AppError::ZoneNotFound(42))));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn invalid_update_leaves_zone_unchanged() {
        let reg = ZoneRegistry::new();
        let id = reg.create(draft("A", CENTER, 100.0)).unwrap();
        let patch = ZonePatch {
            radius_meters: Some(-1.0),
            ..Default::default()
        };
        assert!(reg.update(id, patch).is_err());
        assert_eq!(reg.get(id).unwrap().radius_meters, 100.0);
    }

    #[test]
    fn boundary_point_is_inside() {
        let reg = ZoneRegistry::new();
        let edge = destination(CENTER, 90.0, 100.0);
        let radius = distance_meters(CENTER, edge);
        let id = reg.create(draft("edge", CENTER, radius)).unwrap();

        let hits = reg.find_containing(edge);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
    }

    #[test]
    fn containing_is_ordered_by_distance_and_skips_inactive() {
        let reg = ZoneRegistry::new();
        let far = reg
            .create(draft("far", destination(CENTER, 0.0, 60.0), 200.0))
            .unwrap();
        let near = reg
            .create(draft("near", destination(CENTER, 0.0, 10.0), 200.0))
            .unwrap();
        let off = reg.create(draft("off", CENTER, 200.0)).unwrap();
        reg.update(
            off,
            ZonePatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let ids: Vec<i64> = reg.find_containing(CENTER).iter().map(|z| z.id).collect();
        assert_eq!(ids, vec![near, far]);

        let (nearest, d) = reg.find_nearest(CENTER).unwrap();
        assert_eq!(nearest.id, near);
        assert!((d - 10.0).abs() < 1e-6);
    }

    #[test]
    fn nearest_is_none_outside_every_zone() {
        let reg = ZoneRegistry::new();
        reg.create(draft("A", CENTER, 100.0)).unwrap();
        assert!(reg.find_nearest(destination(CENTER, 0.0, 150.0)).is_none());
    }

    #[test]
    fn load_keeps_ids_and_continues_numbering() {
        let reg = ZoneRegistry::new();
        let mut z = draft("stored", CENTER, 80.0).into_zone(7);
        reg.load(vec![z.clone()], 0).unwrap();
        assert_eq!(reg.create(draft("new", CENTER, 10.0)).unwrap(), 8);

        z.radius_meters = 0.0;
        assert!(reg.load(vec![z], 0).is_err());
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn load_never_reissues_deleted_ids() {
        let reg = ZoneRegistry::new();
        let kept = draft("kept", CENTER, 80.0).into_zone(2);
        reg.load(vec![kept], 5).unwrap();
        assert_eq!(reg.create(draft("new", CENTER, 10.0)).unwrap(), 6);

        let empty = ZoneRegistry::new();
        empty.load(Vec::new(), 1).unwrap();
        assert_eq!(empty.create(draft("annex", CENTER, 10.0)).unwrap(), 2);
    }
}
