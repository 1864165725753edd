//! The query service: intersect component-kind sets, plus spatial/time
//! filters and on-demand secondary indexes.
//!
//! Unknown kinds and absent components are never errors here — an unknown
//! kind yields an empty result set, an absent component yields `None`.

use fxhash::FxHashMap;

use crate::buffer::PositionBuffer;
use crate::component::{ComponentKind, ComponentStore, Frame, Position, QueryableComponent, TimeVisibility};
use crate::handle::Handle;

/// Six half-space planes in `(a, b, c, d)` form, `a*x + b*y + c*z + d >= 0`
/// meaning "inside".
#[derive(Debug, Clone)]
pub struct Frustum {
    pub planes: [[f64; 4]; 6],
}

impl Frustum {
    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        self.planes
            .iter()
            .all(|p| p[0] * x + p[1] * y + p[2] * z + p[3] >= 0.0)
    }
}

/// Named secondary index: a key function applied to every matching
/// handle, rebuilt on demand and never auto-maintained.
#[derive(Default)]
struct Index {
    by_key: FxHashMap<u64, Vec<Handle>>,
}

/// Read-only view over a component store and position buffer used to
/// answer queries. Borrowed fresh each time a query runs; results are
/// plain `Vec<Handle>` snapshots, safe to hold while mutating the handles
/// they name.
pub struct QueryService<'a> {
    store: &'a ComponentStore,
    buffer: &'a PositionBuffer,
    indexes: FxHashMap<String, Index>,
}

impl<'a> QueryService<'a> {
    pub fn new(store: &'a ComponentStore, buffer: &'a PositionBuffer) -> Self {
        QueryService {
            store,
            buffer,
            indexes: FxHashMap::default(),
        }
    }

    /// Intersection of handles carrying every listed kind. Evaluated by
    /// picking the smallest per-kind table and filtering against the
    /// rest. An empty `kinds` slice returns an empty result — there is
    /// nothing to intersect against.
    pub fn with(&self, kinds: &[ComponentKind]) -> Vec<Handle> {
        let Some(&smallest) = kinds.iter().min_by_key(|k| self.store.table_len(**k)) else {
            return Vec::new();
        };

        self.store
            .handles_with_kind(smallest)
            .into_iter()
            .filter(|h| self.store.kinds_of(*h).contains_all(kinds))
            .collect()
    }

    /// Filter a typed component table by a row predicate.
    pub fn where_<T: QueryableComponent>(&self, predicate: impl Fn(&T) -> bool) -> Vec<Handle> {
        T::table_of(self.store)
            .iter()
            .filter(|(_, row)| predicate(row))
            .map(|(h, _)| *h)
            .collect()
    }

    /// Handles with a `time-visibility` component whose interval contains `t`.
    pub fn visible_at(&self, t: f64) -> Vec<Handle> {
        self.where_::<TimeVisibility>(|tv| tv.contains(t))
    }

    /// Brute-force squared-distance test against `position` rows.
    pub fn in_radius(&self, center: (f64, f64, f64), radius_km: f64, frame: Option<Frame>) -> Vec<Handle> {
        let r2 = radius_km * radius_km;
        self.where_::<Position>(|p| {
            if let Some(f) = frame {
                if p.frame != f {
                    return false;
                }
            }
            let dx = p.x - center.0;
            let dy = p.y - center.1;
            let dz = p.z - center.2;
            dx * dx + dy * dy + dz * dz <= r2
        })
    }

    /// Point-in-frustum test against `position` rows.
    pub fn in_frustum(&self, frustum: &Frustum) -> Vec<Handle> {
        self.where_::<Position>(|p| frustum.contains(p.x, p.y, p.z))
    }

    /// Rebuild a named secondary index from a key function over handles
    /// matching `kinds`.
    pub fn build_index(&mut self, name: &str, kinds: &[ComponentKind], key_fn: impl Fn(Handle) -> u64) {
        let mut index = Index::default();
        for handle in self.with(kinds) {
            index.by_key.entry(key_fn(handle)).or_default().push(handle);
        }
        self.indexes.insert(name.to_string(), index);
    }

    pub fn lookup(&self, name: &str, key: u64) -> Vec<Handle> {
        self.indexes
            .get(name)
            .and_then(|idx| idx.by_key.get(&key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn slot_of(&self, handle: Handle) -> Option<crate::buffer::Slot> {
        self.buffer.slot_of(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PositionBuffer;
    use crate::component::{ComponentStore, EntityTable, Frame};

    fn fixture() -> (EntityTable, ComponentStore, PositionBuffer) {
        (EntityTable::new(100), ComponentStore::new(), PositionBuffer::new(100))
    }

    #[test]
    fn with_intersects_kind_sets() {
        let (mut entities, mut store, buffer) = fixture();
        let a = entities.create().unwrap();
        let b = entities.create().unwrap();

        store
            .attach_position(a, Position { x: 0.0, y: 0.0, z: 0.0, frame: Frame::Eci })
            .unwrap();
        store
            .attach_position(b, Position { x: 0.0, y: 0.0, z: 0.0, frame: Frame::Eci })
            .unwrap();
        store
            .attach_velocity(a, crate::component::Velocity { vx: 1.0, vy: 0.0, vz: 0.0, frame: Frame::Eci })
            .unwrap();

        let query = QueryService::new(&store, &buffer);
        let both = query.with(&[ComponentKind::Position, ComponentKind::Velocity]);
        assert_eq!(both, vec![a]);
    }

    #[test]
    fn empty_store_returns_empty() {
        let (_entities, store, buffer) = fixture();
        let query = QueryService::new(&store, &buffer);
        assert!(query.with(&[ComponentKind::Position]).is_empty());
    }

    #[test]
    fn visible_at_filters_by_interval() {
        let (mut entities, mut store, buffer) = fixture();
        let a = entities.create().unwrap();
        let b = entities.create().unwrap();
        store
            .attach_time_visibility(a, crate::component::TimeVisibility { start_ms: 0.0, end_ms: 100.0 })
            .unwrap();
        store
            .attach_time_visibility(b, crate::component::TimeVisibility { start_ms: 200.0, end_ms: 300.0 })
            .unwrap();

        let query = QueryService::new(&store, &buffer);
        assert_eq!(query.visible_at(50.0), vec![a]);
    }

    #[test]
    fn in_radius_brute_forces_distance() {
        let (mut entities, mut store, buffer) = fixture();
        let near = entities.create().unwrap();
        let far = entities.create().unwrap();
        store
            .attach_position(near, Position { x: 1.0, y: 0.0, z: 0.0, frame: Frame::Eci })
            .unwrap();
        store
            .attach_position(far, Position { x: 1000.0, y: 0.0, z: 0.0, frame: Frame::Eci })
            .unwrap();

        let query = QueryService::new(&store, &buffer);
        let hits = query.in_radius((0.0, 0.0, 0.0), 10.0, None);
        assert_eq!(hits, vec![near]);
    }

    #[test]
    fn index_round_trips_lookup() {
        let (mut entities, mut store, buffer) = fixture();
        let a = entities.create().unwrap();
        store
            .attach_position(a, Position { x: 0.0, y: 0.0, z: 0.0, frame: Frame::Eci })
            .unwrap();

        let mut query = QueryService::new(&store, &buffer);
        query.build_index("by_parity", &[ComponentKind::Position], |h| (h.raw() % 2) as u64);
        let key = a.raw() as u64 % 2;
        assert_eq!(query.lookup("by_parity", key), vec![a]);
    }
}
