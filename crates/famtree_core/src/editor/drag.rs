//! Node drag gesture state machine.
//!
//! # Responsibility
//! - Decide the drag axis from the first pointer sample that leaves the
//!   deadzone.
//! - Turn pointer samples into target positions for the dragged people.
//!
//! # Invariants
//! - No position changes while the gesture is `Undetermined`.
//! - In `Group` mode the axis chosen at the first qualifying sample holds for
//!   the whole gesture; in `Spacing` mode the dominant axis is re-evaluated on
//!   every sample.
//! - Positions are always computed from the drag-start positions, so samples
//!   never accumulate rounding drift.

use crate::layout::connectors::Point;
use crate::model::person::PersonId;

/// How a drag treats the multiple-birth group of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Move the target and its whole multiple-birth group, axis-locked.
    Group,
    /// Move only the target, axis chosen continuously.
    Spacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Undetermined { origin: Point },
    LockedX { origin: Point },
    LockedY { origin: Point },
}

/// Axis-lock state machine for one pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    state: DragState,
    deadzone: f64,
}

impl DragGesture {
    pub fn new(deadzone: f64) -> Self {
        Self {
            state: DragState::Idle,
            deadzone,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn press(&mut self, origin: Point) {
        self.state = DragState::Undetermined { origin };
    }

    /// Feeds one pointer sample; returns the delta from the press origin once
    /// an axis has been chosen.
    pub fn sample(&mut self, pointer: Point) -> Option<(f64, f64)> {
        match self.state {
            DragState::Idle => None,
            DragState::Undetermined { origin } => {
                let (dx, dy) = (pointer.x - origin.x, pointer.y - origin.y);
                if dx * dx + dy * dy < self.deadzone * self.deadzone {
                    return None;
                }
                self.state = if dx.abs() > dy.abs() {
                    DragState::LockedX { origin }
                } else {
                    DragState::LockedY { origin }
                };
                Some((dx, dy))
            }
            DragState::LockedX { origin } | DragState::LockedY { origin } => {
                Some((pointer.x - origin.x, pointer.y - origin.y))
            }
        }
    }

    pub fn axis(&self) -> Option<Axis> {
        match self.state {
            DragState::LockedX { .. } => Some(Axis::X),
            DragState::LockedY { .. } => Some(Axis::Y),
            DragState::Idle | DragState::Undetermined { .. } => None,
        }
    }

    pub fn release(&mut self) {
        self.state = DragState::Idle;
    }
}

/// Active drag over one or more people.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    mode: DragMode,
    gesture: DragGesture,
    /// Dragged people with their start positions; the target comes first.
    members: Vec<(PersonId, Point)>,
    moved: bool,
}

impl DragSession {
    /// Starts a drag. `members[0]` must be the target.
    pub fn new(mode: DragMode, origin: Point, deadzone: f64, members: Vec<(PersonId, Point)>) -> Self {
        let mut gesture = DragGesture::new(deadzone);
        gesture.press(origin);
        Self {
            mode,
            gesture,
            members,
            moved: false,
        }
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn axis(&self) -> Option<Axis> {
        self.gesture.axis()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &PersonId> {
        self.members.iter().map(|(id, _)| id)
    }

    pub fn has_moved(&self) -> bool {
        self.moved
    }

    /// Positions for every member after `pointer`; empty inside the deadzone.
    pub fn update(&mut self, pointer: Point) -> Vec<(PersonId, Point)> {
        let Some((dx, dy)) = self.gesture.sample(pointer) else {
            return Vec::new();
        };
        let locked_axis = self.gesture.axis();
        self.moved = true;

        self.members
            .iter()
            .enumerate()
            .map(|(index, (id, start))| {
                let mut next = *start;
                match self.mode {
                    DragMode::Spacing if index > 0 => {}
                    DragMode::Spacing => {
                        if dx.abs() > dy.abs() {
                            next.x += dx;
                        } else {
                            next.y += dy;
                        }
                    }
                    DragMode::Group => {
                        if locked_axis == Some(Axis::X) {
                            next.x += dx;
                        } else {
                            next.y += dy;
                        }
                    }
                }
                (id.clone(), next)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, DragGesture, DragMode, DragSession, DragState};
    use crate::layout::connectors::Point;
    use crate::model::person::PersonId;

    #[test]
    fn gesture_waits_for_deadzone_then_locks() {
        let mut gesture = DragGesture::new(5.0);
        gesture.press(Point::new(0.0, 0.0));
        assert_eq!(gesture.sample(Point::new(3.0, 3.0)), None);
        assert!(matches!(gesture.state(), DragState::Undetermined { .. }));

        assert_eq!(gesture.sample(Point::new(6.0, 2.0)), Some((6.0, 2.0)));
        assert_eq!(gesture.axis(), Some(Axis::X));

        // Later vertical travel does not flip the lock.
        assert_eq!(gesture.sample(Point::new(1.0, 40.0)), Some((1.0, 40.0)));
        assert_eq!(gesture.axis(), Some(Axis::X));

        gesture.release();
        assert_eq!(gesture.state(), DragState::Idle);
        assert_eq!(gesture.sample(Point::new(9.0, 9.0)), None);
    }

    #[test]
    fn group_mode_moves_everyone_along_locked_axis() {
        let members = vec![
            (PersonId::new("a"), Point::new(0.0, 0.0)),
            (PersonId::new("b"), Point::new(110.0, 0.0)),
        ];
        let mut session = DragSession::new(DragMode::Group, Point::new(0.0, 0.0), 5.0, members);
        let moved = session.update(Point::new(2.0, 10.0));
        assert_eq!(moved[0].1, Point::new(0.0, 10.0));
        assert_eq!(moved[1].1, Point::new(110.0, 10.0));

        let moved = session.update(Point::new(50.0, 12.0));
        assert_eq!(moved[1].1, Point::new(110.0, 12.0));
        assert!(session.has_moved());
    }

    #[test]
    fn spacing_mode_moves_only_target_on_dominant_axis() {
        let members = vec![
            (PersonId::new("a"), Point::new(0.0, 0.0)),
            (PersonId::new("b"), Point::new(110.0, 0.0)),
        ];
        let mut session = DragSession::new(DragMode::Spacing, Point::new(0.0, 0.0), 5.0, members);
        let moved = session.update(Point::new(0.0, 8.0));
        assert_eq!(moved[0].1, Point::new(0.0, 8.0));
        assert_eq!(moved[1].1, Point::new(110.0, 0.0));

        let moved = session.update(Point::new(30.0, 8.0));
        assert_eq!(moved[0].1, Point::new(30.0, 0.0));
    }
}
