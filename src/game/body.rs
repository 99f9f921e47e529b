use bitflags::bitflags;
use glam::Vec2;
use crate::Rect;

bitflags! {
    /// Groups a level entity belongs to.
    /// Groups are not mutually exclusive.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TileGroups: u8 {
        /// Drawn.
        const VISIBLE       = 0b00000001;
        /// Drawn sorted by vertical position, after flat tiles.
        const DEPTH         = 0b00000010;
        /// Blocks movement.
        const OBSTACLE      = 0b00000100;
        /// Updated every frame.
        const DYNAMIC       = 0b00001000;
        /// Takes damage from weapons.
        const VULNERABLE    = 0b00010000;
        /// Can be picked up.
        const ITEM          = 0b00100000;
    }
}

/// Placement of a level entity.
/// `rect` is the drawn area, `collider` the part used for collisions.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Body {
    pub rect: Rect,
    pub collider: Rect,
    pub collider_ratio: Vec2,
}

impl Body {

    pub fn new(rect: Rect, collider_ratio: Vec2) -> Self {
        Self {
            rect,
            collider: rect.scaled(collider_ratio),
            collider_ratio,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.collider.center()
    }

    /// Moves the body, one axis at a time, pushing it out of obstacles it runs into.
    /// The side it is pushed to depends on the sign of `direction`.
    pub fn move_and_collide(&mut self, displacement: Vec2, direction: Vec2, obstacles: &[Rect]) {
        self.collider.origin.x += displacement.x;
        for obstacle in obstacles {
            if !obstacle.intersects(&self.collider) { continue }
            if direction.x > 0.0 {
                self.collider.origin.x = obstacle.left() - self.collider.size.x;
            }
            else {
                self.collider.origin.x = obstacle.right();
            }
        }

        self.collider.origin.y += displacement.y;
        for obstacle in obstacles {
            if !obstacle.intersects(&self.collider) { continue }
            if direction.y > 0.0 {
                self.collider.origin.y = obstacle.top() - self.collider.size.y;
            }
            else {
                self.collider.origin.y = obstacle.bottom();
            }
        }

        self.rect = self.rect.with_center(self.collider.center());
    }
}
