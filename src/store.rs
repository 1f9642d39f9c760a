//! Collaborator boundaries of the generator.
//!
//! The catalog is read-only. The assignment store is the single authority on
//! conflicts: the generator proposes, the store accepts or rejects.

use crate::data::{
    AssignmentId, AssignmentRequest, ClassUnit, CourseUnitId, HourType, HourTypeRequirement,
    ProgramId, Room, RoomId, SlotId, TeacherId, TimeSlot,
};
use crate::error::StoreError;
use std::fmt;

pub trait CatalogStore {
    /// Active classes in stable catalog order, optionally limited to one program.
    fn classes(&self, program: Option<ProgramId>) -> Result<Vec<ClassUnit>, StoreError>;

    /// Requirements of a course unit, ordered by hour type code.
    fn hour_requirements(
        &self,
        course_unit: CourseUnitId,
    ) -> Result<Vec<HourTypeRequirement>, StoreError>;

    fn hour_type_by_code(&self, code: &str) -> Result<Option<HourType>, StoreError>;

    /// All time slots ordered by (day, start).
    fn time_slots(&self) -> Result<Vec<TimeSlot>, StoreError>;

    /// Active rooms ordered by capacity, largest first.
    fn active_rooms(&self) -> Result<Vec<Room>, StoreError>;

    fn responsible_teacher(&self, course_unit: CourseUnitId)
    -> Result<Option<TeacherId>, StoreError>;

    /// Lowest-id active teacher, if any.
    fn first_active_teacher(&self) -> Result<Option<TeacherId>, StoreError>;
}

/// Which exclusivity rule a rejected commit broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    TeacherBusy { teacher_id: TeacherId, slot_id: SlotId },
    RoomBusy { room_id: RoomId, slot_id: SlotId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Accepted(AssignmentId),
    Conflict(ConflictKind),
    CapacityExceeded { room_capacity: u32, class_size: u32 },
    InvalidReference(String),
}

impl fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitOutcome::Accepted(id) => write!(f, "accepted as assignment {id}"),
            CommitOutcome::Conflict(ConflictKind::TeacherBusy { teacher_id, slot_id }) => {
                write!(f, "teacher {teacher_id} already busy in slot {slot_id}")
            }
            CommitOutcome::Conflict(ConflictKind::RoomBusy { room_id, slot_id }) => {
                write!(f, "room {room_id} already busy in slot {slot_id}")
            }
            CommitOutcome::CapacityExceeded { room_capacity, class_size } => write!(
                f,
                "room capacity {room_capacity} below class size {class_size}"
            ),
            CommitOutcome::InvalidReference(what) => write!(f, "invalid reference: {what}"),
        }
    }
}

pub trait AssignmentStore {
    /// Atomically validates and commits one assignment.
    ///
    /// Rule violations come back as `Ok` with a non-accepted outcome; `Err`
    /// is reserved for the store itself failing.
    fn try_commit(&self, request: &AssignmentRequest) -> Result<CommitOutcome, StoreError>;
}
