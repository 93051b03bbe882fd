//! World state management.
//!
//! The world owns every zone and every object. A tick runs in two passes
//! over the object table, ordered by id:
//!
//! 1. each object's turn: pending client claims or NPC behaviour, then
//!    movement up to `now`;
//! 2. visibility recompute for every sighted object.
//!
//! Outbound messages are built only after both passes, so they always
//! describe one consistent snapshot.

use crate::ai::{Aggressive, Behavior, Pathfinder, Senses, Wanders};
use crate::config::{BehaviorKind, Config, NpcConfig, PlayerConfig};
use crate::entity::{MoveState, ObjectKind, Placement, Vision, WorldObject};
use crate::error::WorldError;
use crate::ids::{ConnectionId, ObjectId, ZoneId};
use crate::math::{Orientation, Point, Vector};
use crate::movement::{self, MoveOutcome};
use crate::reconcile::{self, Tolerances, Verdict};
use crate::spatial::{Zone, ZoneBounds};
use crate::time::Timestamp;
use crate::visibility::{self, SightCalculator, VisibilityDelta};
use protocol::messages::{ServerMessage, StateChangeRequest};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info};

/// Heading changes below this are not reported as transitions.
const ANGLE_EPSILON: f64 = 1e-6;

/// A message addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub connection: ConnectionId,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn new(connection: ConnectionId, message: ServerMessage) -> Self {
        Self { connection, message }
    }
}

/// Object and cell counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub objects: usize,
    pub actors: usize,
    pub players: usize,
    pub cells: usize,
    pub zones: usize,
}

/// The simulated world.
#[derive(Debug)]
pub struct World {
    /// Next object id to hand out. Ids are never reused.
    next_id: u32,
    zones: HashMap<ZoneId, Zone>,
    objects: HashMap<ObjectId, WorldObject>,
    /// Actor bound to each connection.
    connections: HashMap<ConnectionId, ObjectId>,
    pathfinder: Pathfinder,
    tolerances: Tolerances,
    player: PlayerConfig,
    /// Time of the last completed tick.
    now: Timestamp,
    tick_count: u64,
}

impl World {
    /// Create an empty world with no zones.
    pub fn new(config: &Config) -> Self {
        Self {
            next_id: 1,
            zones: HashMap::new(),
            objects: HashMap::new(),
            connections: HashMap::new(),
            pathfinder: Pathfinder::new(config.pathfinder.max_nodes),
            tolerances: Tolerances::from_config(config),
            player: config.player.clone(),
            now: Timestamp::default(),
            tick_count: 0,
        }
    }

    /// Build the default zone, its walls, the configured NPCs and bots.
    pub fn from_config(config: &Config) -> Result<Self, WorldError> {
        let mut world = Self::new(config);

        let zc = &config.zone;
        let id = ZoneId::default();
        let mut zone = if zc.unbounded {
            Zone::new(id, zc.cell_size)
        } else {
            Zone::bounded(id, zc.cell_size, ZoneBounds::new(zc.min.into(), zc.max.into()))
        };
        zone.fill();
        for &wall in &zc.walls {
            let p = Point::from(wall);
            if !(zone.set_walkable(p, false) && zone.set_blocks_vision(p, true)) {
                return Err(WorldError::NoCell(p, id));
            }
        }
        world.add_zone(zone)?;

        for npc in &config.npcs {
            world.add_object(npc_from_config(npc, config.player.ray_cast), id)?;
        }
        if config.server.bots > 0 {
            world.spawn_bots(id, config.server.bots)?;
        }
        Ok(world)
    }

    /// Register a zone under its id. A registered zone is never replaced.
    pub fn add_zone(&mut self, zone: Zone) -> Result<(), WorldError> {
        let id = zone.id();
        if self.zones.contains_key(&id) {
            return Err(WorldError::ZoneInUse(id));
        }
        info!("Zone {} ready with {} cells", id, zone.cell_count());
        self.zones.insert(id, zone);
        Ok(())
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    /// Mutable zone access for terrain edits (walkable and vision flags).
    pub fn zone_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(&id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &WorldObject)> {
        self.objects.iter().map(|(&id, obj)| (id, obj))
    }

    /// Actor bound to `connection`.
    pub fn actor_of(&self, connection: ConnectionId) -> Option<ObjectId> {
        self.connections.get(&connection).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Time of the last tick.
    #[inline]
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Assign an id to `object` and insert it into the cell at its
    /// position.
    pub fn add_object(&mut self, object: WorldObject, zone: ZoneId) -> Result<ObjectId, WorldError> {
        if let Ok(id) = object.id() {
            return Err(WorldError::IdAlreadyAssigned(id));
        }
        let id = ObjectId(self.next_id);
        if self.objects.contains_key(&id) {
            return Err(WorldError::DuplicateId(id));
        }
        self.insert(object, id, zone)?;
        self.next_id = self.next_id.saturating_add(1);
        Ok(id)
    }

    /// Insert `object` under a caller-chosen id, e.g. one restored from
    /// storage.
    ///
    /// Every id below the counter is either live or retired, so a
    /// free id must be at or above it; the counter then skips past it.
    pub fn add_object_with_id(&mut self, object: WorldObject, id: ObjectId, zone: ZoneId) -> Result<ObjectId, WorldError> {
        if self.objects.contains_key(&id) {
            return Err(WorldError::DuplicateId(id));
        }
        if id.0 < self.next_id {
            return Err(WorldError::RetiredId(id));
        }
        if let Ok(existing) = object.id() {
            return Err(WorldError::IdAlreadyAssigned(existing));
        }
        self.insert(object, id, zone)?;
        self.next_id = id.0.saturating_add(1);
        Ok(id)
    }

    fn insert(&mut self, mut object: WorldObject, id: ObjectId, zone_id: ZoneId) -> Result<(), WorldError> {
        if let Some(connection) = object.connection() {
            if self.connections.contains_key(&connection) {
                return Err(WorldError::ConnectionInUse(connection));
            }
        }
        let zone = self.zones.get_mut(&zone_id).ok_or(WorldError::UnknownZone(zone_id))?;
        let cell = zone.point_of(object.position());
        if zone.get_cell(cell).is_none() {
            return Err(WorldError::NoCell(cell, zone_id));
        }

        object.assign_id(id)?;
        zone.insert_member(cell, id);
        object.set_placement(Some(Placement { zone: zone_id, cell }));
        object.timing.last_update_start = self.now;
        object.timing.last_update_end = self.now;

        if let Some(connection) = object.connection() {
            self.connections.insert(connection, id);
        }
        debug!("Added {:?} '{}' as {} at {:?} in {}", object.kind(), object.name(), id, cell, zone_id);
        self.objects.insert(id, object);
        Ok(())
    }

    /// Remove an object, clearing its cell membership and retiring its id.
    ///
    /// Observers receive `ObjectInvisible` on the next tick.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<WorldObject, WorldError> {
        let mut object = self.objects.remove(&id).ok_or(WorldError::UnknownObject(id))?;
        if let Some(placement) = object.placement() {
            if let Some(zone) = self.zones.get_mut(&placement.zone) {
                zone.remove_member(placement.cell, id);
            }
        }
        object.set_placement(None);
        if let Some(connection) = object.connection() {
            self.connections.remove(&connection);
        }
        debug!("Removed {} '{}'", id, object.name());
        Ok(object)
    }

    /// Remove the actor bound to `connection`.
    pub fn remove_connection(&mut self, connection: ConnectionId) -> Result<WorldObject, WorldError> {
        let id = self.actor_of(connection).ok_or(WorldError::UnknownConnection(connection))?;
        self.remove_object(id)
    }

    /// Queue a client's movement claim on its actor. It is evaluated during
    /// that actor's next turn.
    pub fn submit_state_change(&mut self, connection: ConnectionId, request: &StateChangeRequest) -> Result<(), WorldError> {
        let id = self.actor_of(connection).ok_or(WorldError::UnknownConnection(connection))?;
        let actor = self.objects.get_mut(&id).ok_or(WorldError::UnknownObject(id))?;
        let position = Vector::new(request.x, request.y, actor.geometry.position.z);
        let claim = MoveState::new(
            Orientation::new(request.absolute_angle, request.relative_angle),
            position,
            Timestamp::from_millis(request.time_of_change),
        );
        let control = actor.control.as_mut().ok_or(WorldError::UnknownConnection(connection))?;
        control.queue(claim);
        Ok(())
    }

    /// Place `count` wandering NPCs on random walkable cells of `zone`.
    pub fn spawn_bots(&mut self, zone: ZoneId, count: usize) -> Result<Vec<ObjectId>, WorldError> {
        let cells: Vec<Point> = self
            .zones
            .get(&zone)
            .ok_or(WorldError::UnknownZone(zone))?
            .walkable_points()
            .collect();
        let mut rng = rand::rng();
        let mut spawned = Vec::with_capacity(count);

        for n in 0..count {
            let Some(&home) = cells.choose(&mut rng) else {
                break;
            };
            let waypoints: Vec<Point> = (0..3)
                .filter_map(|_| cells.choose(&mut rng).copied())
                .filter(|p| p.z == home.z)
                .collect();
            let dwell = Duration::from_millis(rng.random_range(1_000..4_000));
            let Some(z) = self.zones.get(&zone) else {
                break;
            };
            let bot = WorldObject::npc(
                format!("Bot {}", n + 1),
                z.center_of(home),
                self.player.speed,
                Vision::new(self.player.vision_radius, self.player.ray_cast),
                Behavior::Wanders(Wanders::new(waypoints, dwell)),
            );
            spawned.push(self.add_object(bot, zone)?);
        }
        info!("Spawned {} bots in {}", spawned.len(), zone);
        Ok(spawned)
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            objects: self.objects.len(),
            actors: self.objects.values().filter(|o| o.is_actor()).count(),
            players: self.connections.len(),
            cells: self.zones.values().map(Zone::cell_count).sum(),
            zones: self.zones.len(),
        }
    }

    /// Run one tick at time `now` and return the messages it produced.
    pub fn tick(&mut self, now: Timestamp) -> Vec<Outbound> {
        self.tick_count += 1;
        self.now = now;

        let mut ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        ids.sort_unstable();

        let mut transitions = Vec::new();
        for &id in &ids {
            if self.take_turn(id, now) {
                transitions.push(id);
            }
        }

        let (deltas, announce) = self.recompute_visibility(&ids);

        let mut out = Vec::new();
        let fresh = self.visibility_messages(&deltas, &announce, now, &mut out);
        self.state_change_messages(&transitions, &fresh, &mut out);
        self.forced_messages(&ids, &mut out);
        out
    }

    /// One object's turn. Returns true when it committed a transition that
    /// observers must hear about.
    fn take_turn(&mut self, id: ObjectId, now: Timestamp) -> bool {
        // Taken out of the table so the other objects stay readable.
        let Some(mut obj) = self.objects.remove(&id) else {
            return false;
        };
        let view = match obj.behavior {
            Some(_) => self.players_in_view(&obj),
            None => Vec::new(),
        };
        let changed = self.run_turn(id, &mut obj, &view, now);
        self.objects.insert(id, obj);
        changed
    }

    fn players_in_view(&self, obj: &WorldObject) -> Vec<(ObjectId, Point)> {
        let Some(vision) = &obj.vision else {
            return Vec::new();
        };
        vision
            .visible()
            .iter()
            .filter_map(|other| {
                let o = self.objects.get(other)?;
                if o.kind() != ObjectKind::Player {
                    return None;
                }
                Some((*other, o.placement()?.cell))
            })
            .collect()
    }

    fn run_turn(&mut self, id: ObjectId, obj: &mut WorldObject, view: &[(ObjectId, Point)], now: Timestamp) -> bool {
        let Some(mut placement) = obj.placement() else {
            return false;
        };
        let Some(zone) = self.zones.get_mut(&placement.zone) else {
            return false;
        };
        let before = obj.geometry.orientation;
        let mut committed = false;

        // Client claims.
        if let Some(control) = obj.control.as_mut() {
            while let Some(claim) = control.pending.pop_front() {
                let verdict = reconcile::evaluate(&obj.geometry, &obj.timing, &placement, zone, &claim, now, &self.tolerances);
                let forced = match verdict {
                    Verdict::Accepted(state) => {
                        match movement::place(id, &mut obj.geometry, &mut placement, zone, state.position) {
                            Some(_) => {
                                obj.geometry.orientation = state.orientation;
                                obj.timing.last_update_start = now;
                                committed = true;
                                continue;
                            }
                            None => MoveState::new(before.stopped(), obj.geometry.position, obj.timing.last_update_start),
                        }
                    }
                    Verdict::Forced(state, why) => {
                        debug!("Forcing state on {}: {:?}", id, why);
                        state
                    }
                };
                obj.geometry.orientation = forced.orientation;
                control.forced = Some(forced);
                control.pending.clear();
            }
        }

        // NPC behaviour.
        if let Some(behavior) = obj.behavior.as_mut() {
            let senses = Senses {
                now,
                cell: placement.cell,
                position: obj.geometry.position,
                orientation: obj.geometry.orientation,
                players_in_view: view,
                zone: &*zone,
                pathfinder: &self.pathfinder,
            };
            let next = behavior.think(&senses);
            if turned(obj.geometry.orientation, next) {
                // Finish the elapsed stretch under the old heading first.
                movement::advance(id, &mut obj.geometry, &obj.timing, &mut placement, zone, now);
                obj.timing.last_update_start = now;
                obj.geometry.orientation = next;
            }
        }

        // Movement.
        let outcome = movement::advance(id, &mut obj.geometry, &obj.timing, &mut placement, zone, now);
        if outcome == MoveOutcome::Blocked {
            debug!("Movement of {} blocked at {:?}", id, placement.cell);
            if let Some(control) = obj.control.as_mut() {
                control.forced = Some(MoveState::new(obj.geometry.orientation, obj.geometry.position, now));
            }
        }

        obj.set_placement(Some(placement));
        obj.timing.last_update_start = now;
        obj.timing.last_update_end = now;

        committed || turned(before, obj.geometry.orientation)
    }

    /// Recompute every sighted object's visible set. Also returns the
    /// connections whose own actor just became visible to them.
    fn recompute_visibility(&mut self, ids: &[ObjectId]) -> (Vec<(ObjectId, VisibilityDelta)>, HashSet<ObjectId>) {
        let mut deltas = Vec::new();
        let mut announce = HashSet::new();
        for &id in ids {
            let Some(obj) = self.objects.get_mut(&id) else {
                continue;
            };
            let Some(placement) = obj.placement() else {
                continue;
            };
            let (Some(vision), Some(zone)) = (obj.vision.as_mut(), self.zones.get(&placement.zone)) else {
                continue;
            };
            let current = SightCalculator::new(zone).visible_objects(placement.cell, vision.radius, vision.ray_cast);
            let delta = visibility::refresh(vision, current);
            if delta.is_empty() {
                continue;
            }
            if let Some(control) = obj.control.as_mut() {
                if !control.speed_announced && delta.appeared.contains(&id) {
                    control.speed_announced = true;
                    announce.insert(id);
                }
            }
            deltas.push((id, delta));
        }
        (deltas, announce)
    }

    /// Visible / invisible / move speed messages. Returns, per observer,
    /// the objects that just became visible to it.
    fn visibility_messages(
        &self,
        deltas: &[(ObjectId, VisibilityDelta)],
        announce: &HashSet<ObjectId>,
        now: Timestamp,
        out: &mut Vec<Outbound>,
    ) -> HashMap<ObjectId, HashSet<ObjectId>> {
        let mut fresh = HashMap::new();
        for (observer, delta) in deltas {
            let Some(connection) = self.objects.get(observer).and_then(WorldObject::connection) else {
                continue;
            };
            for gone in &delta.vanished {
                out.push(Outbound::new(connection, ServerMessage::ObjectInvisible { id: gone.0 }));
            }
            for seen in &delta.appeared {
                let Some(target) = self.objects.get(seen) else {
                    continue;
                };
                let snapshot = target.snapshot(*seen, now);
                let message = if target.is_actor() {
                    ServerMessage::ActorVisible(snapshot)
                } else {
                    ServerMessage::ObjectVisible(snapshot)
                };
                out.push(Outbound::new(connection, message));
            }
            if announce.contains(observer) {
                if let Some(me) = self.objects.get(observer) {
                    out.push(Outbound::new(
                        connection,
                        ServerMessage::ActorMoveSpeed { move_speed: me.geometry.speed },
                    ));
                }
            }
            fresh.insert(*observer, delta.appeared.iter().copied().collect());
        }
        fresh
    }

    /// `StateChange` for each transition, to every other connection that
    /// already had the actor in view.
    fn state_change_messages(
        &self,
        transitions: &[ObjectId],
        fresh: &HashMap<ObjectId, HashSet<ObjectId>>,
        out: &mut Vec<Outbound>,
    ) {
        if transitions.is_empty() {
            return;
        }
        let mut observers: Vec<(ConnectionId, ObjectId)> = self.connections.iter().map(|(&c, &o)| (c, o)).collect();
        observers.sort_unstable_by_key(|&(_, o)| o);

        for &actor in transitions {
            let Some(obj) = self.objects.get(&actor) else {
                continue;
            };
            let message = ServerMessage::StateChange {
                id: actor.0,
                relative_angle: obj.geometry.orientation.relative,
                absolute_angle: obj.geometry.orientation.absolute,
                time_of_change: obj.timing.last_update_start.as_millis(),
                position: obj.geometry.position,
            };
            for &(connection, observer) in &observers {
                if observer == actor {
                    continue;
                }
                let sees = self
                    .objects
                    .get(&observer)
                    .and_then(|o| o.vision.as_ref())
                    .is_some_and(|v| v.sees(actor));
                let just_appeared = fresh.get(&observer).is_some_and(|s| s.contains(&actor));
                if sees && !just_appeared {
                    out.push(Outbound::new(connection, message.clone()));
                }
            }
        }
    }

    /// Deliver each pending correction exactly once.
    fn forced_messages(&mut self, ids: &[ObjectId], out: &mut Vec<Outbound>) {
        for id in ids {
            let Some(control) = self.objects.get_mut(id).and_then(|o| o.control.as_mut()) else {
                continue;
            };
            if let Some(state) = control.take_forced() {
                out.push(Outbound::new(
                    control.connection,
                    ServerMessage::ForceState {
                        relative_angle: state.orientation.relative,
                        absolute_angle: state.orientation.absolute,
                        position: state.position,
                        time_of_force: state.timestamp.as_millis(),
                    },
                ));
            }
        }
    }
}

/// Whether `next` differs from `prev` enough to be a new movement state.
fn turned(prev: Orientation, next: Orientation) -> bool {
    prev.relative != next.relative || (!next.is_idle() && (prev.absolute - next.absolute).abs() > ANGLE_EPSILON)
}

fn npc_from_config(npc: &NpcConfig, ray_cast: bool) -> WorldObject {
    let behavior = match npc.behavior {
        BehaviorKind::Aggressive => Behavior::Aggressive(Aggressive::new()),
        BehaviorKind::Wanders => Behavior::Wanders(Wanders::new(
            npc.waypoints.iter().copied().map(Point::from).collect(),
            Duration::from_millis(npc.dwell_ms),
        )),
    };
    // Names go on the wire NUL-terminated.
    WorldObject::npc(
        npc.name.replace('\0', ""),
        Vector::from_array(npc.position),
        npc.speed,
        Vision::new(npc.vision_radius, ray_cast),
        behavior,
    )
}
