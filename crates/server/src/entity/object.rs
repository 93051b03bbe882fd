//! The composed world object.

use super::components::{Controller, Geometry, Identification, MoveState, ObjectKind, Placement, Timing, Vision};
use crate::ai::Behavior;
use crate::error::WorldError;
use crate::ids::{ConnectionId, ObjectId};
use crate::math::{Orientation, Vector};
use crate::time::Timestamp;
use protocol::messages::ObjectSnapshot;

/// An entity in the world.
///
/// Built externally, then handed to `World::add_object`, which assigns the
/// id and the placement.
#[derive(Debug, Clone)]
pub struct WorldObject {
    ident: Identification,
    pub geometry: Geometry,
    pub timing: Timing,
    pub vision: Option<Vision>,
    pub control: Option<Controller>,
    pub behavior: Option<Behavior>,
    placement: Option<Placement>,
}

impl WorldObject {
    /// Create an object with no capabilities beyond position.
    pub fn new(name: impl Into<String>, kind: ObjectKind, position: Vector) -> Self {
        Self {
            ident: Identification {
                id: None,
                name: name.into(),
                kind,
            },
            geometry: Geometry {
                position,
                orientation: Orientation::IDLE,
                speed: 0.0,
            },
            timing: Timing::default(),
            vision: None,
            control: None,
            behavior: None,
            placement: None,
        }
    }

    /// A client-controlled actor.
    pub fn player(name: impl Into<String>, position: Vector, speed: f64, vision: Vision, connection: ConnectionId) -> Self {
        Self::new(name, ObjectKind::Player, position)
            .with_speed(speed)
            .with_vision(vision)
            .with_controller(Controller::new(connection))
    }

    /// A server-controlled actor.
    pub fn npc(name: impl Into<String>, position: Vector, speed: f64, vision: Vision, behavior: Behavior) -> Self {
        Self::new(name, ObjectKind::Npc, position)
            .with_speed(speed)
            .with_vision(vision)
            .with_behavior(behavior)
    }

    /// A static object.
    pub fn item(name: impl Into<String>, position: Vector) -> Self {
        Self::new(name, ObjectKind::Item, position)
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.geometry.speed = speed;
        self
    }

    pub fn with_vision(mut self, vision: Vision) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.control = Some(controller);
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// The assigned id.
    pub fn id(&self) -> Result<ObjectId, WorldError> {
        self.ident.id.ok_or(WorldError::IdNotAssigned)
    }

    /// Whether an id was assigned.
    #[inline]
    pub fn has_id(&self) -> bool {
        self.ident.id.is_some()
    }

    /// Assign the id. Fails if one is already set.
    pub fn assign_id(&mut self, id: ObjectId) -> Result<(), WorldError> {
        match self.ident.id {
            Some(existing) => Err(WorldError::IdAlreadyAssigned(existing)),
            None => {
                self.ident.id = Some(id);
                Ok(())
            }
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.ident.name
    }

    #[inline]
    pub fn kind(&self) -> ObjectKind {
        self.ident.kind
    }

    #[inline]
    pub fn is_actor(&self) -> bool {
        self.ident.kind.is_actor()
    }

    #[inline]
    pub fn position(&self) -> Vector {
        self.geometry.position
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.geometry.orientation
    }

    /// Zone and cell this object is indexed under.
    #[inline]
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub(crate) fn set_placement(&mut self, placement: Option<Placement>) {
        self.placement = placement;
    }

    /// Connection controlling this object, if any.
    #[inline]
    pub fn connection(&self) -> Option<ConnectionId> {
        self.control.as_ref().map(|c| c.connection)
    }

    /// Current committed movement state.
    pub fn move_state(&self) -> MoveState {
        MoveState::new(self.geometry.orientation, self.geometry.position, self.timing.last_update_start)
    }

    /// Client-facing description of this object.
    pub fn snapshot(&self, id: ObjectId, observed_at: Timestamp) -> ObjectSnapshot {
        ObjectSnapshot {
            id: id.0,
            name: self.ident.name.clone(),
            type_id: self.ident.kind.type_id(),
            position: self.geometry.position,
            relative_angle: self.geometry.orientation.relative,
            absolute_angle: self.geometry.orientation.absolute,
            speed: self.geometry.speed,
            observed_at: observed_at.as_millis(),
        }
    }
}
