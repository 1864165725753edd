//! The component store: typed tables keyed by (component-kind, handle),
//! plus a reverse kind-index and a per-frame dirty set.
//!
//! Each component kind is a closed Rust type with its own densely packed
//! table, rather than a duck-typed bag of fields. Queries intersect kind
//! sets (`KindSet`, a thin wrapper over `bit_set::BitSet`) instead of
//! inspecting row shapes.

use bit_set::BitSet;
use fxhash::{FxHashMap, FxHashSet};

use crate::error::StoreError;
use crate::handle::{Handle, HandleAllocator};
use crate::propagator::Propagator;
use crate::tle::Tle;

/// Reference frame carried on every position/velocity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    Eci,
    Ecef,
    J2000,
    Teme,
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keplerian {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub arg_of_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cartesian {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub frame: Frame,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementsData {
    Keplerian(Keplerian),
    Tle(Tle),
    Cartesian(Cartesian),
}

/// `orbital-elements` component: a tagged union plus an epoch. Immutable
/// after attach — replace the whole row to change it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalElements {
    pub data: ElementsData,
    pub epoch_ms: f64,
}

/// `propagator` component: owns a boxed propagator bound to the elements
/// at attach time.
pub struct PropagatorComponent {
    pub propagator: Box<dyn Propagator>,
}

impl std::fmt::Debug for PropagatorComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagatorComponent").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub frame: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub frame: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    pub size: f32,
    pub color_rgb: u32,
    pub size_attenuated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry_key: String,
    pub material_key: String,
    pub scale: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub offset: [f32; 2],
    pub style: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeVisibility {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl TimeVisibility {
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_ms && t <= self.end_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub matrix: [[f32; 4]; 4],
}

/// Bit index of each component kind, stable for the crate's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    OrbitalElements,
    Propagator,
    Position,
    Velocity,
    Billboard,
    Mesh,
    Label,
    TimeVisibility,
    Transform,
}

pub const KIND_COUNT: usize = 9;

impl ComponentKind {
    fn bit(self) -> usize {
        self as usize
    }

    pub const ALL: [ComponentKind; KIND_COUNT] = [
        ComponentKind::OrbitalElements,
        ComponentKind::Propagator,
        ComponentKind::Position,
        ComponentKind::Velocity,
        ComponentKind::Billboard,
        ComponentKind::Mesh,
        ComponentKind::Label,
        ComponentKind::TimeVisibility,
        ComponentKind::Transform,
    ];
}

/// A small set of component kinds, backed by a bitset for cheap
/// intersection during queries.
#[derive(Debug, Clone, Default)]
pub struct KindSet(BitSet);

impl KindSet {
    pub fn new() -> Self {
        KindSet(BitSet::with_capacity(KIND_COUNT))
    }

    pub fn insert(&mut self, kind: ComponentKind) {
        self.0.insert(kind.bit());
    }

    pub fn remove(&mut self, kind: ComponentKind) {
        self.0.remove(kind.bit());
    }

    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.0.contains(kind.bit())
    }

    pub fn contains_all(&self, kinds: &[ComponentKind]) -> bool {
        kinds.iter().all(|k| self.contains(*k))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

macro_rules! component_tables {
    ( $( $kind:ident : $field:ident => $ty:ty ),* $(,)? ) => {
        #[derive(Default)]
        struct Tables {
            $( $field: FxHashMap<Handle, $ty>, )*
        }

        impl ComponentStore {
            $(
                ::paste::paste! {
                    #[doc = "Attach a `" $field "` row, overwriting any prior row and marking the handle dirty."]
                    pub fn [<attach_ $field>](&mut self, handle: Handle, value: $ty) -> Result<(), StoreError> {
                        if matches!(ComponentKind::$kind, ComponentKind::Propagator)
                            && !self.tables.orbital_elements.contains_key(&handle)
                        {
                            return Err(StoreError::InvariantViolation(handle));
                        }
                        self.tables.$field.insert(handle, value);
                        self.mark_kind(handle, ComponentKind::$kind);
                        self.dirty.insert(handle);
                        Ok(())
                    }

                    #[doc = "Detach the `" $field "` row, if any."]
                    pub fn [<detach_ $field>](&mut self, handle: Handle) -> Option<$ty> {
                        let removed = self.tables.$field.remove(&handle);
                        if removed.is_some() {
                            self.unmark_kind(handle, ComponentKind::$kind);
                            self.dirty.insert(handle);
                        }
                        removed
                    }

                    #[doc = "Read the `" $field "` row, if attached. Returns `None`, never errors, per the Absent contract."]
                    pub fn $field(&self, handle: Handle) -> Option<&$ty> {
                        self.tables.$field.get(&handle)
                    }

                    #[doc = "Mutably read the `" $field "` row, if attached. Marks the handle dirty."]
                    pub fn [<$field _mut>](&mut self, handle: Handle) -> Option<&mut $ty> {
                        if self.tables.$field.contains_key(&handle) {
                            self.dirty.insert(handle);
                        }
                        self.tables.$field.get_mut(&handle)
                    }
                }
            )*

            fn remove_all_rows(&mut self, handle: Handle) {
                $( self.tables.$field.remove(&handle); )*
            }

            fn table_len(&self, kind: ComponentKind) -> usize {
                match kind {
                    $( ComponentKind::$kind => self.tables.$field.len(), )*
                }
            }

            fn handles_of(&self, kind: ComponentKind) -> Vec<Handle> {
                match kind {
                    $( ComponentKind::$kind => self.tables.$field.keys().copied().collect(), )*
                }
            }
        }

        $(
            impl QueryableComponent for $ty {
                fn table_of(store: &ComponentStore) -> &FxHashMap<Handle, Self> {
                    &store.tables.$field
                }

                const KIND: ComponentKind = ComponentKind::$kind;
            }
        )*
    };
}

/// Implemented by every component row type, giving the query service
/// static, typed access to a kind's table without `Any`-downcasting.
pub trait QueryableComponent: Sized {
    fn table_of(store: &ComponentStore) -> &FxHashMap<Handle, Self>;
    const KIND: ComponentKind;
}

component_tables! {
    OrbitalElements: orbital_elements => OrbitalElements,
    Propagator: propagator => PropagatorComponent,
    Position: position => Position,
    Velocity: velocity => Velocity,
    Billboard: billboard => Billboard,
    Mesh: mesh => Mesh,
    Label: label => Label,
    TimeVisibility: time_visibility => TimeVisibility,
    Transform: transform => Transform,
}

/// `map<kind, map<handle, row>>` plus the reverse `handle -> kinds` index.
#[derive(Default)]
pub struct ComponentStore {
    tables: Tables,
    kinds_of_handle: FxHashMap<Handle, KindSet>,
    dirty: FxHashSet<Handle>,
}

impl ComponentStore {
    pub fn new() -> Self {
        ComponentStore::default()
    }

    fn mark_kind(&mut self, handle: Handle, kind: ComponentKind) {
        self.kinds_of_handle.entry(handle).or_insert_with(KindSet::new).insert(kind);
    }

    fn unmark_kind(&mut self, handle: Handle, kind: ComponentKind) {
        if let Some(set) = self.kinds_of_handle.get_mut(&handle) {
            set.remove(kind);
        }
    }

    /// O(1 in kinds) lookup of which component kinds a handle carries.
    pub fn kinds_of(&self, handle: Handle) -> KindSet {
        self.kinds_of_handle.get(&handle).cloned().unwrap_or_default()
    }

    pub fn table_len(&self, kind: ComponentKind) -> usize {
        ComponentStore::table_len(self, kind)
    }

    pub fn handles_with_kind(&self, kind: ComponentKind) -> Vec<Handle> {
        self.handles_of(kind)
    }

    /// Remove every row for `handle` across all tables (used by `World::destroy`).
    pub fn destroy(&mut self, handle: Handle) {
        self.remove_all_rows(handle);
        self.kinds_of_handle.remove(&handle);
        self.dirty.insert(handle);
    }

    pub fn is_dirty(&self, handle: Handle) -> bool {
        self.dirty.contains(&handle)
    }

    pub fn dirty_handles(&self) -> impl Iterator<Item = &Handle> {
        self.dirty.iter()
    }

    /// Cleared by the scheduler at the end of every frame.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }
}

/// Owns the handle allocator, component store, and tracks which handles are
/// currently live. Destruction here removes all component rows; releasing
/// the handle's position-buffer slot is the caller's job (typically done
/// together in `World::destroy`, see `crate::lib`).
pub struct EntityTable {
    allocator: HandleAllocator,
    live: FxHashSet<Handle>,
}

impl EntityTable {
    pub fn new(max_live: usize) -> Self {
        EntityTable {
            allocator: HandleAllocator::new(max_live),
            live: FxHashSet::default(),
        }
    }

    pub fn create(&mut self) -> Result<Handle, StoreError> {
        let handle = self.allocator.create()?;
        self.live.insert(handle);
        Ok(handle)
    }

    pub fn is_alive(&self, handle: Handle) -> bool {
        self.live.contains(&handle)
    }

    pub fn destroy(&mut self, handle: Handle) -> bool {
        if self.live.remove(&handle) {
            self.allocator.destroy(handle);
            true
        } else {
            false
        }
    }

    pub fn live_count(&self) -> usize {
        self.allocator.live_count()
    }

    pub fn max_live(&self) -> usize {
        self.allocator.max_live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_and_detach_round_trips() {
        let mut entities = EntityTable::new(10);
        let mut store = ComponentStore::new();
        let handle = entities.create().unwrap();

        store
            .attach_position(handle, Position { x: 1.0, y: 2.0, z: 3.0, frame: Frame::Eci })
            .unwrap();
        assert!(store.kinds_of(handle).contains(ComponentKind::Position));

        let removed = store.detach_position(handle);
        assert!(removed.is_some());
        assert!(!store.kinds_of(handle).contains(ComponentKind::Position));
    }

    #[test]
    fn propagator_requires_orbital_elements() {
        let mut entities = EntityTable::new(10);
        let mut store = ComponentStore::new();
        let handle = entities.create().unwrap();

        let err = store
            .attach_propagator(
                handle,
                PropagatorComponent {
                    propagator: Box::new(crate::propagator::rk2::Rk2Propagator::new()),
                },
            )
            .unwrap_err();
        assert_eq!(err, StoreError::InvariantViolation(handle));
    }

    #[test]
    fn destroy_clears_every_kind() {
        let mut entities = EntityTable::new(10);
        let mut store = ComponentStore::new();
        let handle = entities.create().unwrap();
        store
            .attach_position(handle, Position { x: 0.0, y: 0.0, z: 0.0, frame: Frame::Eci })
            .unwrap();
        store
            .attach_label(handle, Label { text: "sat".into(), offset: [0.0, 0.0], style: "default".into() })
            .unwrap();

        store.destroy(handle);
        assert!(store.kinds_of(handle).is_empty());
        assert!(store.position(handle).is_none());
        assert!(store.label(handle).is_none());
    }

    #[test]
    fn dirty_set_tracks_mutation_and_clears() {
        let mut entities = EntityTable::new(10);
        let mut store = ComponentStore::new();
        let handle = entities.create().unwrap();
        store
            .attach_position(handle, Position { x: 0.0, y: 0.0, z: 0.0, frame: Frame::Eci })
            .unwrap();
        assert!(store.is_dirty(handle));
        store.clear_dirty();
        assert!(!store.is_dirty(handle));
    }
}
