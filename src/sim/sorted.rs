//! Depth-ordered container of live entities
//!
//! Entities are kept back-to-front: earlier entries are updated and drawn
//! first. The order is `(depth, insertion sequence)`, so entities at the same
//! depth keep their relative order from frame to frame and never flicker.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::object::{GameObject, ObjectId};

/// Live entities in draw order
#[derive(Debug, Default)]
pub struct SortedGameObjectsList {
    objects: Vec<GameObject>,
    /// id -> slot in `objects`, rebuilt after every structural change
    index: HashMap<ObjectId, usize>,
    next_seq: u64,
}

fn draw_order(a: &GameObject, b: &GameObject) -> Ordering {
    a.depth.total_cmp(&b.depth).then(a.seq.cmp(&b.seq))
}

impl SortedGameObjectsList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Insert at its depth slot, behind every entity already at that depth
    pub fn insert(&mut self, mut object: GameObject) {
        object.seq = self.next_seq;
        self.next_seq += 1;
        object.depth = object.depth_key();

        let slot = self
            .objects
            .partition_point(|o| draw_order(o, &object) == Ordering::Less);
        self.objects.insert(slot, object);
        self.reindex();
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<GameObject> {
        let slot = self.index.get(&id).copied()?;
        let object = self.objects.remove(slot);
        self.reindex();
        Some(object)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.index.get(&id).map(|&slot| &self.objects[slot])
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.index.get(&id).map(|&slot| &mut self.objects[slot])
    }

    /// Entities in draw order
    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }

    /// Entities in draw order; the list itself cannot change meanwhile
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.iter_mut()
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|o| o.id).collect()
    }

    /// Recompute depth for mobile entities and restore draw order.
    /// Static entities keep the depth captured when they were inserted.
    pub fn resort_for_dynamic_game_objects(&mut self) {
        for object in self.objects.iter_mut().filter(|o| o.kind.is_dynamic()) {
            object.depth = object.depth_key();
        }
        self.objects.sort_by(draw_order);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index.clear();
        self.index
            .extend(self.objects.iter().enumerate().map(|(slot, o)| (o.id, slot)));
    }
}
