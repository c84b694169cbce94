//! Render Queue
//!
//! Decouples scene traversal from GPU submission. Scene code
//! [`submit`](RenderQueue::submit)s commands in any order; the renderer
//! [`sort`](RenderQueue::sort)s them once before recording passes and
//! [`clear`](RenderQueue::clear)s the queue after the frame is submitted.
//!
//! # Ordering
//!
//! | Sequence     | Order          | Reason                        |
//! |--------------|----------------|-------------------------------|
//! | opaque       | front-to-back  | early-z rejects hidden pixels |
//! | transparent  | back-to-front  | correct "over" blending       |
//!
//! Ties have no defined order.
//!
//! # Object Slots
//!
//! Per-draw uniforms live in one array per frame: opaque commands occupy
//! slots `0..opaque_len`, transparent commands follow. [`RenderQueue::object_slots`]
//! and [`RenderQueue::shadow_casters`] report slots in that numbering.

use super::command::RenderCommand;
use crate::core::Aabb;

#[derive(Debug, Default)]
pub struct RenderQueue {
    opaques: Vec<RenderCommand>,
    transparents: Vec<RenderCommand>,
    scene_bounds: Aabb,
}

impl RenderQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `command` by its transparency flag and grows the scene bounds by
    /// its world origin (an approximation, not a tight fit).
    pub fn submit(&mut self, command: RenderCommand) {
        self.scene_bounds.expand_point(command.world_position());
        if command.transparent {
            self.transparents.push(command);
        } else {
            self.opaques.push(command);
        }
    }

    pub fn sort(&mut self) {
        self.opaques
            .sort_unstable_by(|a, b| a.distance_to_camera.total_cmp(&b.distance_to_camera));
        self.transparents
            .sort_unstable_by(|a, b| b.distance_to_camera.total_cmp(&a.distance_to_camera));
    }

    /// Empties both sequences and resets the bounds. Call once per frame.
    pub fn clear(&mut self) {
        self.opaques.clear();
        self.transparents.clear();
        self.scene_bounds = Aabb::EMPTY;
    }

    #[inline]
    #[must_use]
    pub fn opaque_commands(&self) -> &[RenderCommand] {
        &self.opaques
    }

    #[inline]
    #[must_use]
    pub fn transparent_commands(&self) -> &[RenderCommand] {
        &self.transparents
    }

    /// Opaque commands with `casts_shadow` set, with their object slot.
    /// Transparent commands never cast shadows.
    pub fn shadow_casters(&self) -> impl Iterator<Item = (u32, &RenderCommand)> {
        self.opaques
            .iter()
            .enumerate()
            .filter(|(_, cmd)| cmd.casts_shadow)
            .map(|(slot, cmd)| (slot as u32, cmd))
    }

    /// Every command with its object slot: opaques first, then transparents.
    pub fn object_slots(&self) -> impl Iterator<Item = (u32, &RenderCommand)> {
        self.opaques
            .iter()
            .chain(&self.transparents)
            .enumerate()
            .map(|(slot, cmd)| (slot as u32, cmd))
    }

    /// Object slot of `transparent_commands()[index]`.
    #[inline]
    #[must_use]
    pub fn transparent_slot(&self, index: usize) -> u32 {
        (self.opaques.len() + index) as u32
    }

    #[inline]
    #[must_use]
    pub fn scene_bounds(&self) -> &Aabb {
        &self.scene_bounds
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.opaques.len() + self.transparents.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
