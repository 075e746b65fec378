//! Entity lifecycle and the per-frame sequence
//!
//! Structural changes never happen while live entities are iterated. `add`
//! and `remove` only queue; `frame_step` applies the queues at the start of
//! the next frame:
//!
//! remove -> add -> cap check -> sort -> update -> render -> collide
//!
//! Anything spawned or destroyed during update/collide goes back through the
//! same queues at the end of the frame.

use std::collections::HashMap;

use super::collision::CollisionManager;
use super::error::SimError;
use super::movement::MovementContext;
use super::object::{GameEvent, GameObject, ObjectId, ObjectKind, Outbox, UpdateContext};
use super::sorted::SortedGameObjectsList;
use super::tick::TickInput;
use super::vector::Position;
use crate::consts::MAX_LIVE_OBJECTS;
use crate::platform::Canvas;

/// What a frame produced
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Player-run events from update and collision reactions
    pub events: Vec<GameEvent>,
    /// Touching pairs found by collision resolution
    pub contacts: Vec<(ObjectId, ObjectId)>,
}

/// Owner of every live entity
#[derive(Debug)]
pub struct GameObjectManager {
    live: SortedGameObjectsList,
    to_add: Vec<GameObject>,
    to_remove: Vec<ObjectId>,
    collisions: CollisionManager,
    next_id: ObjectId,
}

impl Default for GameObjectManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GameObjectManager {
    pub fn new() -> Self {
        Self {
            live: SortedGameObjectsList::new(),
            to_add: Vec::new(),
            to_remove: Vec::new(),
            collisions: CollisionManager::new(),
            next_id: 1,
        }
    }

    /// Queue `object` for insertion and return its id.
    ///
    /// Live observers of the object's kind are notified right away, so they
    /// can decide on the object's path before it ever moves.
    pub fn add(&mut self, mut object: GameObject) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        object.id = id;

        let observers = self.collisions.observers_of(object.kind).to_vec();
        for observer in observers {
            let Some(watcher) = self.live.get_mut(observer) else {
                continue;
            };
            if watcher.decide_path(&object) {
                self.collisions.register_path_decision(observer, id);
            }
        }

        self.to_add.push(object);
        id
    }

    /// Queue `id` for removal
    pub fn remove(&mut self, id: ObjectId) {
        if !self.to_remove.contains(&id) {
            self.to_remove.push(id);
        }
    }

    /// Drop pending additions and queue every live entity for removal
    pub fn remove_all(&mut self) {
        for pending in self.to_add.drain(..) {
            self.collisions.remove_from_collision_management(pending.id);
        }
        for id in self.live.ids() {
            if !self.to_remove.contains(&id) {
                self.to_remove.push(id);
            }
        }
        log::debug!("Queued {} live entities for removal", self.to_remove.len());
    }

    // === Queries ===

    pub fn live(&self) -> &SortedGameObjectsList {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.live.get(id)
    }

    pub fn collisions(&self) -> &CollisionManager {
        &self.collisions
    }

    pub fn pending_additions(&self) -> usize {
        self.to_add.len()
    }

    pub fn pending_removals(&self) -> usize {
        self.to_remove.len()
    }

    pub fn count_kind(&self, kind: ObjectKind) -> usize {
        self.live.iter().filter(|o| o.kind == kind).count()
    }

    /// Live enemies, for the HUD
    pub fn enemy_count(&self) -> usize {
        self.live.iter().filter(|o| o.kind.is_enemy()).count()
    }

    fn player_position(&self) -> Option<Position> {
        self.live
            .iter()
            .find(|o| o.kind == ObjectKind::Fighter && o.is_active())
            .map(|o| o.position)
    }

    // === Frame ===

    /// Advance every live entity by one frame.
    ///
    /// Fails when applying the queued additions pushes the live count over
    /// `MAX_LIVE_OBJECTS`; nothing past the cap check runs in that case.
    pub fn frame_step(
        &mut self,
        input: &TickInput,
        suppress_collision_effects: bool,
        canvas: &mut dyn Canvas,
    ) -> Result<FrameReport, SimError> {
        self.apply_removals();
        self.apply_additions();

        if self.live.len() > MAX_LIVE_OBJECTS {
            log::error!("Live entity cap exceeded: {}", self.live.len());
            return Err(SimError::EntityCapExceeded {
                live: self.live.len(),
                cap: MAX_LIVE_OBJECTS,
            });
        }

        self.live.resort_for_dynamic_game_objects();

        let mut outbox = Outbox::default();
        self.update_all(input, &mut outbox);

        for object in self.live.iter() {
            object.render(canvas);
        }

        let contacts =
            self.collisions
                .manage_collisions(&mut self.live, suppress_collision_effects, &mut outbox);

        let Outbox {
            spawned,
            removed,
            events,
        } = outbox;
        for id in removed {
            self.remove(id);
        }
        for object in spawned {
            self.add(object);
        }

        Ok(FrameReport { events, contacts })
    }

    fn apply_removals(&mut self) {
        for id in std::mem::take(&mut self.to_remove) {
            // Removing a still-pending addition cancels it
            if let Some(slot) = self.to_add.iter().position(|o| o.id == id) {
                self.to_add.remove(slot);
            } else if self.live.remove(id).is_none() {
                log::debug!("Removal of unknown entity {id} ignored");
            }
            self.collisions.remove_from_collision_management(id);
        }
    }

    fn apply_additions(&mut self) {
        for object in std::mem::take(&mut self.to_add) {
            self.collisions.add_to_collision_management(&object);
            self.live.insert(object);
        }
    }

    fn update_all(&mut self, input: &TickInput, outbox: &mut Outbox) {
        let positions: HashMap<ObjectId, Position> =
            self.live.iter().map(|o| (o.id, o.position)).collect();
        let ctx = UpdateContext {
            movement: MovementContext::new(&positions, input.steer),
            fire: input.fire,
            player: self.player_position(),
        };

        for object in self.live.iter_mut() {
            object.update(&ctx, outbox);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{DrawCall, HeadlessPlatform};
    use crate::sim::movement::StationaryInterpolated;
    use crate::sim::object::{Behavior, forward};
    use proptest::prelude::*;

    fn still(kind: ObjectKind, at: Position) -> GameObject {
        GameObject::new(kind, StationaryInterpolated::from_points(at, at)).with_position(at)
    }

    fn barrier(at: Position) -> GameObject {
        still(ObjectKind::Barrier, at).with_behavior(Behavior::Barrier {
            notified: 0,
            intercepts: 0,
        })
    }

    fn step(manager: &mut GameObjectManager, platform: &mut HeadlessPlatform) -> FrameReport {
        manager
            .frame_step(&TickInput::default(), false, platform)
            .expect("frame within cap")
    }

    #[test]
    fn test_added_entity_goes_live_next_frame() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();

        let id = manager.add(still(ObjectKind::Tank, Position::new(10.0, 10.0)));
        assert!(manager.get(id).is_none());
        assert_eq!(manager.pending_additions(), 1);

        step(&mut manager, &mut platform);
        assert!(manager.get(id).is_some());
        assert!(manager.collisions().is_managed(id));

        manager.remove(id);
        assert!(manager.get(id).is_some());
        step(&mut manager, &mut platform);
        assert!(manager.get(id).is_none());
        assert!(!manager.collisions().is_managed(id));
    }

    #[test]
    fn test_add_then_remove_same_frame_never_live() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();

        let id = manager.add(still(ObjectKind::Tank, Position::default()));
        manager.remove(id);
        step(&mut manager, &mut platform);

        assert!(manager.is_empty());
        assert!(!manager.collisions().is_managed(id));
    }

    #[test]
    fn test_entity_cap() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();

        for _ in 0..MAX_LIVE_OBJECTS {
            manager.add(still(ObjectKind::Tank, Position::default()));
        }
        assert!(manager.frame_step(&TickInput::default(), false, &mut platform).is_ok());
        assert_eq!(manager.len(), MAX_LIVE_OBJECTS);

        manager.add(still(ObjectKind::Tank, Position::default()));
        let err = manager
            .frame_step(&TickInput::default(), false, &mut platform)
            .unwrap_err();
        assert_eq!(
            err,
            SimError::EntityCapExceeded {
                live: MAX_LIVE_OBJECTS + 1,
                cap: MAX_LIVE_OBJECTS
            }
        );
    }

    #[test]
    fn test_removal_before_addition_keeps_count_under_cap() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();

        let first = manager.add(still(ObjectKind::Tank, Position::default()));
        for _ in 1..MAX_LIVE_OBJECTS {
            manager.add(still(ObjectKind::Tank, Position::default()));
        }
        step(&mut manager, &mut platform);

        // One out, one in: the removal lands first, so the cap holds
        manager.remove(first);
        manager.add(still(ObjectKind::Tank, Position::default()));
        step(&mut manager, &mut platform);
        assert_eq!(manager.len(), MAX_LIVE_OBJECTS);
    }

    #[test]
    fn test_remove_all_clears_pending_and_live() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();

        manager.add(still(ObjectKind::Tank, Position::default()));
        manager.add(still(ObjectKind::Tower, Position::default()));
        step(&mut manager, &mut platform);
        manager.add(still(ObjectKind::Drone, Position::default()));

        manager.remove_all();
        assert_eq!(manager.pending_additions(), 0);
        assert_eq!(manager.pending_removals(), 2);

        step(&mut manager, &mut platform);
        assert!(manager.is_empty());
        assert_eq!(manager.collisions().pair_count(), 0);
    }

    #[test]
    fn test_render_follows_sorted_order() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();

        manager.add(still(ObjectKind::Saucer, Position::new(10.0, 10.0)));
        manager.add(still(ObjectKind::Tank, Position::new(20.0, 400.0)));
        manager.add(still(ObjectKind::Tank, Position::new(30.0, 100.0)));
        step(&mut manager, &mut platform);

        let drawn: Vec<f32> = platform
            .draw_calls()
            .iter()
            .filter_map(|c| match c {
                DrawCall::Image { at, .. } => Some(at.x),
                _ => None,
            })
            .collect();
        // Ground tanks back to front, then the saucer above them
        assert_eq!(drawn, vec![30.0, 20.0, 10.0]);
    }

    #[test]
    fn test_fighter_laser_enters_through_queue() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();
        manager.add(GameObject::fighter(Position::new(100.0, 450.0)));
        step(&mut manager, &mut platform);

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        manager.frame_step(&fire, false, &mut platform).unwrap();
        assert_eq!(manager.count_kind(ObjectKind::Laser), 0);
        assert_eq!(manager.pending_additions(), 1);

        step(&mut manager, &mut platform);
        assert_eq!(manager.count_kind(ObjectKind::Laser), 1);
    }

    #[test]
    fn test_path_decision_notifies_live_observers_once_per_spawn() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();
        let at = Position::new(400.0, 300.0);

        // A laser queued before the barrier is live is never reported to it
        let early = manager.add(GameObject::laser(at.offset(-forward() * 100.0)));
        let wall = manager.add(barrier(at));
        step(&mut manager, &mut platform);
        assert!(!manager.collisions().is_paired(wall, early));

        let through = manager.add(GameObject::laser(at.offset(-forward() * 100.0)));
        // Heads up and away above the barrier
        let clear = manager.add(GameObject::laser(Position::new(0.0, 100.0)));

        let notified = |m: &GameObjectManager| match m.get(wall).map(|o| &o.behavior) {
            Some(Behavior::Barrier { notified, intercepts }) => (*notified, *intercepts),
            _ => panic!("barrier missing"),
        };
        // Notified at enqueue time, before either laser is live
        assert_eq!(notified(&manager), (2, 1));
        assert!(manager.collisions().is_paired(wall, through));
        assert!(!manager.collisions().is_paired(wall, clear));

        step(&mut manager, &mut platform);
        assert_eq!(notified(&manager), (2, 1));
    }

    #[test]
    fn test_blocked_laser_dies_on_barrier() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();
        let at = Position::new(400.0, 300.0);
        let wall = manager.add(barrier(at));
        step(&mut manager, &mut platform);

        let laser = manager.add(GameObject::laser(at.offset(-forward() * 30.0)));
        for _ in 0..10 {
            step(&mut manager, &mut platform);
        }
        assert!(manager.get(laser).is_none());
        assert!(manager.get(wall).is_some());
    }

    #[test]
    fn test_suppressed_frame_has_no_effects() {
        let mut manager = GameObjectManager::new();
        let mut platform = HeadlessPlatform::new();
        let at = Position::new(200.0, 200.0);
        manager.add(still(ObjectKind::Tank, at).with_altitude(1));
        manager.add(still(ObjectKind::Laser, at).with_behavior(Behavior::Projectile { ttl: 100 }));

        let report = manager
            .frame_step(&TickInput::default(), true, &mut platform)
            .unwrap();
        assert_eq!(report.contacts.len(), 1);
        assert!(report.events.is_empty());
        assert_eq!(manager.pending_removals(), 0);

        let report = step(&mut manager, &mut platform);
        assert_eq!(report.events.len(), 1);
        assert_eq!(manager.pending_removals(), 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Remove(usize),
        Frame,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Add),
            2 => (0usize..64).prop_map(Op::Remove),
            1 => Just(Op::Frame),
        ]
    }

    proptest! {
        #[test]
        fn prop_removed_before_frame_never_live(ops in prop::collection::vec(op(), 1..80)) {
            let mut manager = GameObjectManager::new();
            let mut platform = HeadlessPlatform::new();
            let mut added: Vec<ObjectId> = Vec::new();
            let mut pending: Vec<ObjectId> = Vec::new();
            let mut doomed: Vec<ObjectId> = Vec::new();

            for op in ops {
                match op {
                    Op::Add => {
                        let id = manager.add(still(ObjectKind::Tank, Position::default()));
                        added.push(id);
                        pending.push(id);
                    }
                    Op::Remove(i) if !added.is_empty() => {
                        let id = added[i % added.len()];
                        manager.remove(id);
                        if pending.contains(&id) {
                            doomed.push(id);
                        }
                    }
                    Op::Remove(_) => {}
                    Op::Frame => {
                        step(&mut manager, &mut platform);
                        for id in &doomed {
                            prop_assert!(manager.get(*id).is_none());
                        }
                        pending.clear();
                    }
                }
            }
            step(&mut manager, &mut platform);
            for id in &doomed {
                prop_assert!(manager.get(*id).is_none());
            }
        }
    }
}
