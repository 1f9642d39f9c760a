use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type ClassId = u32;
pub type CourseUnitId = u32;
pub type ProgramId = u32;
pub type HourTypeId = u32;
pub type RoomId = u32;
pub type TeacherId = u32;
pub type SlotId = u32;
pub type AssignmentId = u32;

/// Minutes since midnight, written as `HH:MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (h, m) = value
            .split_once(':')
            .ok_or_else(|| format!("invalid clock time '{value}', expected HH:MM"))?;
        let hour: u16 = h.trim().parse().map_err(|_| format!("invalid hour in '{value}'"))?;
        let minute: u16 = m.trim().parse().map_err(|_| format!("invalid minute in '{value}'"))?;
        ClockTime::new(hour, minute).ok_or_else(|| format!("clock time '{value}' out of range"))
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes() / 60, self.minutes() % 60)
    }
}

/// A cohort of students following one course unit under one program.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassUnit {
    pub id: ClassId,
    pub designation: String,
    pub student_count: u32,
    pub course_unit_id: CourseUnitId,
    pub course_unit_code: String,
    pub program_id: ProgramId,
    pub program_code: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HourType {
    pub id: HourTypeId,
    pub code: String,
}

/// Teaching hours of one hour type required by a course unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourTypeRequirement {
    pub hour_type: HourType,
    pub hours: u32,
}

/// Sessions of one hour type still to be placed for a class. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub class_id: ClassId,
    pub hour_type: HourType,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: SlotId,
    /// 1 = Monday.
    pub day: u8,
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeSlot {
    pub fn sort_key(&self) -> (u8, ClockTime) {
        (self.day, self.start)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} {}-{}", self.day, self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    pub room_type: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A commit attempt submitted to the assignment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub class_id: ClassId,
    pub teacher_id: TeacherId,
    pub room_id: RoomId,
    pub slot_id: SlotId,
    pub hour_type_id: Option<HourTypeId>,
    pub note: Option<String>,
}

/// A committed session ("aula").
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: AssignmentId,
    pub class_id: ClassId,
    pub teacher_id: TeacherId,
    pub room_id: RoomId,
    pub slot_id: SlotId,
    pub hour_type_id: Option<HourTypeId>,
    pub note: Option<String>,
    pub active: bool,
}

fn default_active() -> bool {
    true
}
