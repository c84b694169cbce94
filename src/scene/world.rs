//! Entity storage.
//!
//! Entities are `slotmap` keys; every component type has its own
//! `SecondaryMap` column indexed by the entity's slot. A [`Component`] impl
//! binds a Rust type to its column at compile time, so the per-frame queries
//! are plain map lookups without any dynamic type dispatch.
//!
//! Iteration follows slot order, which makes every query deterministic for a
//! given sequence of spawns and despawns.

use slotmap::{SecondaryMap, SlotMap, new_key_type};

use super::camera::Camera;
use super::light::DirectionalLight;
use super::mesh_renderer::MeshRenderer;
use super::transform::Transform;

new_key_type! {
    /// Entity id: slot index plus version, stale ids never alias new entities.
    pub struct Entity;
}

/// A type stored in one column of the [`World`].
pub trait Component: Sized + 'static {
    fn column(world: &World) -> &SecondaryMap<Entity, Self>;
    fn column_mut(world: &mut World) -> &mut SecondaryMap<Entity, Self>;
}

macro_rules! impl_component {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl Component for $ty {
                #[inline]
                fn column(world: &World) -> &SecondaryMap<Entity, Self> {
                    &world.$field
                }
                #[inline]
                fn column_mut(world: &mut World) -> &mut SecondaryMap<Entity, Self> {
                    &mut world.$field
                }
            }
        )*

        impl World {
            fn remove_all_components(&mut self, entity: Entity) {
                $( self.$field.remove(entity); )*
            }
        }
    };
}

#[derive(Debug, Default)]
pub struct World {
    entities: SlotMap<Entity, ()>,

    transforms: SecondaryMap<Entity, Transform>,
    mesh_renderers: SecondaryMap<Entity, MeshRenderer>,
    cameras: SecondaryMap<Entity, Camera>,
    directional_lights: SecondaryMap<Entity, DirectionalLight>,
}

impl_component! {
    Transform => transforms,
    MeshRenderer => mesh_renderers,
    Camera => cameras,
    DirectionalLight => directional_lights,
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> Entity {
        self.entities.insert(())
    }

    /// Removes the entity and all of its components. Returns `false` if it was
    /// already gone.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }
        self.remove_all_components(entity);
        true
    }

    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Attaches (or replaces) a component.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive.
    #[track_caller]
    pub fn add<C: Component>(&mut self, entity: Entity, component: C) {
        assert!(self.is_alive(entity), "add component to dead entity {entity:?}");
        C::column_mut(self).insert(entity, component);
    }

    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        C::column(self).contains_key(entity)
    }

    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        C::column(self).get(entity)
    }

    #[inline]
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        C::column_mut(self).get_mut(entity)
    }

    pub fn remove<C: Component>(&mut self, entity: Entity) -> Option<C> {
        C::column_mut(self).remove(entity)
    }

    /// All entities carrying `C`, in slot order.
    pub fn iter<C: Component>(&self) -> impl Iterator<Item = (Entity, &C)> {
        C::column(self).iter()
    }

    pub fn iter_mut<C: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut C)> {
        C::column_mut(self).iter_mut()
    }

    /// Entities carrying both `A` and `B`, in slot order.
    pub fn join<A: Component, B: Component>(&self) -> impl Iterator<Item = (Entity, &A, &B)> {
        let other = B::column(self);
        A::column(self)
            .iter()
            .filter_map(move |(entity, a)| other.get(entity).map(|b| (entity, a, b)))
    }
}
