//! Collision registration and per-frame resolution
//!
//! Entities are paired up when they enter collision management, using the
//! kind table in `ObjectKind::collides_with`. Each pair is stored once, under
//! one of its two ids, so a frame evaluates it exactly once.
//!
//! Path decisions are the second way into the registry: an observer kind
//! (barriers) is told about every spawn of the kind it watches (lasers) and
//! registers the pair itself when the projectile's path crosses it, whatever
//! the kind table says.

use std::collections::{BTreeMap, BTreeSet};

use super::object::{CollisionReaction, GameObject, ObjectId, ObjectKind, Outbox};
use super::sorted::SortedGameObjectsList;
use super::vector::Position;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Position,
    pub max: Position,
}

impl Bounds {
    /// Box centered on `center`
    pub fn around(center: Position, width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self {
            min: Position::new(center.x - hw, center.y - hh),
            max: Position::new(center.x + hw, center.y + hh),
        }
    }

    /// Overlap test; touching edges count
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn contains(&self, p: Position) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether the segment `from`-`to` passes through the box (slab test)
    pub fn intersects_segment(&self, from: Position, to: Position) -> bool {
        let d = from.vector_to(to).0;
        let mut t_enter: f32 = 0.0;
        let mut t_exit: f32 = 1.0;

        for (origin, dir, lo, hi) in [
            (from.x, d.x, self.min.x, self.max.x),
            (from.y, d.y, self.min.y, self.max.y),
        ] {
            if dir.abs() < f32::EPSILON {
                // Parallel to this slab: must already be inside it
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let t1 = (lo - origin) / dir;
            let t2 = (hi - origin) / dir;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }
}

/// Whether two live entities touch this frame: both colliding, adjacent
/// altitude bands, overlapping boxes
pub fn touching(a: &GameObject, b: &GameObject) -> bool {
    a.is_colliding()
        && b.is_colliding()
        && a.altitude.abs_diff(b.altitude) <= 1
        && a.bounds().overlaps(&b.bounds())
}

/// Collision registry
#[derive(Debug, Default)]
pub struct CollisionManager {
    /// Pairs to check, each stored under exactly one of its ids
    registry: BTreeMap<ObjectId, BTreeSet<ObjectId>>,
    /// Entities under collision management
    members: BTreeMap<ObjectId, ObjectKind>,
    /// Path-decision observers keyed by the kind they watch
    observers: BTreeMap<ObjectKind, Vec<ObjectId>>,
}

impl CollisionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start checking `object` against every compatible member
    pub fn add_to_collision_management(&mut self, object: &GameObject) {
        if !object.kind.is_colliding() || self.members.contains_key(&object.id) {
            return;
        }
        let partners: Vec<ObjectId> = self
            .members
            .iter()
            .filter(|(_, kind)| kind.collides_with(object.kind))
            .map(|(id, _)| *id)
            .collect();

        self.members.insert(object.id, object.kind);
        for partner in partners {
            self.register_pair(partner, object.id);
        }
        if let Some(watched) = object.kind.watches() {
            self.observers.entry(watched).or_default().push(object.id);
        }
    }

    /// Forget `id` everywhere: membership, pairs, observer lists
    pub fn remove_from_collision_management(&mut self, id: ObjectId) {
        self.members.remove(&id);
        self.registry.remove(&id);
        for partners in self.registry.values_mut() {
            partners.remove(&id);
        }
        for observers in self.observers.values_mut() {
            observers.retain(|o| *o != id);
        }
    }

    /// Pair an observer with a projectile whose path it decided to block
    pub fn register_path_decision(&mut self, observer: ObjectId, projectile: ObjectId) -> bool {
        self.register_pair(observer, projectile)
    }

    /// Observers that want to hear about every spawn of `kind`
    pub fn observers_of(&self, kind: ObjectKind) -> &[ObjectId] {
        self.observers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_managed(&self, id: ObjectId) -> bool {
        self.members.contains_key(&id)
    }

    /// Whether `a` and `b` are checked against each other
    pub fn is_paired(&self, a: ObjectId, b: ObjectId) -> bool {
        self.registry.get(&a).is_some_and(|s| s.contains(&b))
            || self.registry.get(&b).is_some_and(|s| s.contains(&a))
    }

    /// Number of pairs checked per frame
    pub fn pair_count(&self) -> usize {
        self.registry.values().map(BTreeSet::len).sum()
    }

    fn register_pair(&mut self, a: ObjectId, b: ObjectId) -> bool {
        if a == b || self.is_paired(a, b) {
            return false;
        }
        self.registry.entry(a).or_default().insert(b)
    }

    /// Check every registered pair once. Touching pairs get both reaction
    /// hooks run unless `suppress_effects` is set. Pairs involving an entity
    /// already queued for removal this frame are skipped.
    ///
    /// Returns the touching pairs.
    pub fn manage_collisions(
        &self,
        objects: &mut SortedGameObjectsList,
        suppress_effects: bool,
        outbox: &mut Outbox,
    ) -> Vec<(ObjectId, ObjectId)> {
        let mut contacts = Vec::new();

        for (&a, partners) in &self.registry {
            for &b in partners {
                if outbox.is_removing(a) || outbox.is_removing(b) {
                    continue;
                }
                let (Some(obj_a), Some(obj_b)) = (objects.get(a), objects.get(b)) else {
                    continue;
                };
                if !touching(obj_a, obj_b) {
                    continue;
                }
                contacts.push((a, b));
                if suppress_effects {
                    continue;
                }

                let (contact_a, contact_b) = (obj_a.contact(), obj_b.contact());
                if let Some(obj) = objects.get_mut(a) {
                    obj.react(&contact_b, outbox);
                }
                if let Some(obj) = objects.get_mut(b) {
                    obj.react(&contact_a, outbox);
                }
            }
        }

        contacts
    }
}
