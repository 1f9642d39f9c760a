//! In-memory catalog and assignment store, loaded from a JSON snapshot.

use crate::data::{
    Assignment, AssignmentId, AssignmentRequest, ClassUnit, CourseUnitId, HourType,
    HourTypeRequirement, ProgramId, Room, Teacher, TeacherId, TimeSlot,
};
use crate::error::{ConfigError, StoreError};
use crate::store::{AssignmentStore, CatalogStore, CommitOutcome, ConflictKind};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementEntry {
    pub hour_type_code: String,
    pub hours: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseUnit {
    pub id: CourseUnitId,
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub responsible_teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub requirements: Vec<RequirementEntry>,
}

/// Everything the catalog knows, as stored on disk.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub hour_types: Vec<HourType>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub course_units: Vec<CourseUnit>,
    #[serde(default)]
    pub classes: Vec<ClassUnit>,
}

impl CatalogSnapshot {
    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::CatalogParse {
            path: path.to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    snapshot: Arc<CatalogSnapshot>,
}

impl InMemoryCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        info!(
            "Catalog loaded: {} classes, {} rooms, {} time slots, {} teachers",
            snapshot.classes.len(),
            snapshot.rooms.len(),
            snapshot.time_slots.len(),
            snapshot.teachers.len()
        );
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    /// An assignment store validating against this catalog.
    pub fn assignment_store(&self) -> InMemoryAssignments {
        InMemoryAssignments {
            catalog: Arc::clone(&self.snapshot),
            assignments: Mutex::new(Vec::new()),
        }
    }
}

impl CatalogStore for InMemoryCatalog {
    fn classes(&self, program: Option<ProgramId>) -> Result<Vec<ClassUnit>, StoreError> {
        let mut classes: Vec<ClassUnit> = self
            .snapshot
            .classes
            .iter()
            .filter(|c| c.active && program.is_none_or(|p| c.program_id == p))
            .cloned()
            .collect();
        classes.sort_by_key(|c| c.id);
        Ok(classes)
    }

    fn hour_requirements(
        &self,
        course_unit: CourseUnitId,
    ) -> Result<Vec<HourTypeRequirement>, StoreError> {
        let Some(unit) = self.snapshot.course_units.iter().find(|u| u.id == course_unit) else {
            return Ok(Vec::new());
        };
        let mut requirements = unit
            .requirements
            .iter()
            .map(|entry| {
                let hour_type = self
                    .hour_type_by_code(&entry.hour_type_code)?
                    .ok_or_else(|| {
                        StoreError::Internal(format!(
                            "course unit {} references unknown hour type '{}'",
                            unit.code, entry.hour_type_code
                        ))
                    })?;
                Ok(HourTypeRequirement {
                    hour_type,
                    hours: entry.hours,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        requirements.sort_by(|a, b| a.hour_type.code.cmp(&b.hour_type.code));
        Ok(requirements)
    }

    fn hour_type_by_code(&self, code: &str) -> Result<Option<HourType>, StoreError> {
        Ok(self
            .snapshot
            .hour_types
            .iter()
            .find(|h| h.code == code)
            .cloned())
    }

    fn time_slots(&self) -> Result<Vec<TimeSlot>, StoreError> {
        let mut slots = self.snapshot.time_slots.clone();
        slots.sort_by_key(TimeSlot::sort_key);
        Ok(slots)
    }

    fn active_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let mut rooms: Vec<Room> = self
            .snapshot
            .rooms
            .iter()
            .filter(|r| r.active)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| b.capacity.cmp(&a.capacity));
        Ok(rooms)
    }

    fn responsible_teacher(
        &self,
        course_unit: CourseUnitId,
    ) -> Result<Option<TeacherId>, StoreError> {
        Ok(self
            .snapshot
            .course_units
            .iter()
            .find(|u| u.id == course_unit)
            .and_then(|u| u.responsible_teacher_id))
    }

    fn first_active_teacher(&self) -> Result<Option<TeacherId>, StoreError> {
        Ok(self
            .snapshot
            .teachers
            .iter()
            .filter(|t| t.active)
            .map(|t| t.id)
            .min())
    }
}

/// Conflict-checked assignment store. Each commit runs check-and-insert under
/// one lock, so concurrent runs cannot double-book.
#[derive(Debug)]
pub struct InMemoryAssignments {
    catalog: Arc<CatalogSnapshot>,
    assignments: Mutex<Vec<Assignment>>,
}

impl InMemoryAssignments {
    /// Active assignments in commit order.
    pub fn active(&self) -> Result<Vec<Assignment>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.iter().filter(|a| a.active).cloned().collect())
    }

    /// Retires an active assignment, freeing its teacher and room slot.
    /// Returns `false` when no active assignment has that id.
    pub fn deactivate(&self, id: AssignmentId) -> Result<bool, StoreError> {
        let mut guard = self.lock()?;
        match guard.iter_mut().find(|a| a.id == id && a.active) {
            Some(assignment) => {
                assignment.active = false;
                debug!("Assignment {id} deactivated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Assignment>>, StoreError> {
        self.assignments
            .lock()
            .map_err(|_| StoreError::Unavailable("assignment store lock poisoned".to_string()))
    }

    fn check_references(&self, request: &AssignmentRequest) -> Result<(u32, u32), String> {
        let catalog = &self.catalog;
        let class = catalog
            .classes
            .iter()
            .find(|c| c.id == request.class_id)
            .ok_or_else(|| format!("class {} not found", request.class_id))?;
        if !catalog.teachers.iter().any(|t| t.id == request.teacher_id) {
            return Err(format!("teacher {} not found", request.teacher_id));
        }
        let room = catalog
            .rooms
            .iter()
            .find(|r| r.id == request.room_id)
            .ok_or_else(|| format!("room {} not found", request.room_id))?;
        if !catalog.time_slots.iter().any(|s| s.id == request.slot_id) {
            return Err(format!("time slot {} not found", request.slot_id));
        }
        if let Some(hour_type_id) = request.hour_type_id {
            if !catalog.hour_types.iter().any(|h| h.id == hour_type_id) {
                return Err(format!("hour type {hour_type_id} not found"));
            }
        }
        Ok((room.capacity, class.student_count))
    }
}

impl AssignmentStore for InMemoryAssignments {
    fn try_commit(&self, request: &AssignmentRequest) -> Result<CommitOutcome, StoreError> {
        let (room_capacity, class_size) = match self.check_references(request) {
            Ok(sizes) => sizes,
            Err(what) => return Ok(CommitOutcome::InvalidReference(what)),
        };
        if room_capacity < class_size {
            return Ok(CommitOutcome::CapacityExceeded {
                room_capacity,
                class_size,
            });
        }

        let mut guard = self.lock()?;
        for existing in guard.iter().filter(|a| a.active && a.slot_id == request.slot_id) {
            if existing.teacher_id == request.teacher_id {
                return Ok(CommitOutcome::Conflict(ConflictKind::TeacherBusy {
                    teacher_id: request.teacher_id,
                    slot_id: request.slot_id,
                }));
            }
            if existing.room_id == request.room_id {
                return Ok(CommitOutcome::Conflict(ConflictKind::RoomBusy {
                    room_id: request.room_id,
                    slot_id: request.slot_id,
                }));
            }
        }

        let id = guard.len() as AssignmentId + 1;
        guard.push(Assignment {
            id,
            class_id: request.class_id,
            teacher_id: request.teacher_id,
            room_id: request.room_id,
            slot_id: request.slot_id,
            hour_type_id: request.hour_type_id,
            note: request.note.clone(),
            active: true,
        });
        Ok(CommitOutcome::Accepted(id))
    }
}

/// Builders for catalog snapshots used across the test modules.
#[cfg(test)]
pub mod fixtures {
    use super::*;
    use crate::data::ClockTime;

    pub fn hour_type(id: u32, code: &str) -> HourType {
        HourType {
            id,
            code: code.to_string(),
        }
    }

    pub fn room(id: u32, room_type: &str, capacity: u32) -> Room {
        Room {
            id,
            name: format!("R{id}"),
            capacity,
            room_type: room_type.to_string(),
            active: true,
        }
    }

    pub fn slot(id: u32, day: u8, hour: u16) -> TimeSlot {
        TimeSlot {
            id,
            day,
            start: ClockTime::new(hour, 0).unwrap(),
            end: ClockTime::new(hour + 2, 0).unwrap(),
        }
    }

    pub fn teacher(id: u32) -> Teacher {
        Teacher {
            id,
            name: format!("Teacher {id}"),
            active: true,
        }
    }

    pub fn course_unit(
        id: u32,
        responsible: Option<TeacherId>,
        requirements: &[(&str, u32)],
    ) -> CourseUnit {
        CourseUnit {
            id,
            code: format!("UC{id}"),
            name: format!("Course unit {id}"),
            responsible_teacher_id: responsible,
            requirements: requirements
                .iter()
                .map(|(code, hours)| RequirementEntry {
                    hour_type_code: code.to_string(),
                    hours: *hours,
                })
                .collect(),
        }
    }

    pub fn class(id: u32, student_count: u32, course_unit_id: u32, program_id: u32) -> ClassUnit {
        ClassUnit {
            id,
            designation: format!("Class {id}"),
            student_count,
            course_unit_id,
            course_unit_code: format!("UC{course_unit_id}"),
            program_id,
            program_code: format!("P{program_id}"),
            active: true,
        }
    }

    /// Hour types T, TP and PL with one teacher and no rooms, slots or classes.
    pub fn base_snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            hour_types: vec![hour_type(1, "T"), hour_type(2, "TP"), hour_type(3, "PL")],
            teachers: vec![teacher(1)],
            ..CatalogSnapshot::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn request(class_id: u32, teacher_id: u32, room_id: u32, slot_id: u32) -> AssignmentRequest {
        AssignmentRequest {
            class_id,
            teacher_id,
            room_id,
            slot_id,
            hour_type_id: Some(1),
            note: None,
        }
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            teachers: vec![teacher(1), teacher(2)],
            rooms: vec![room(1, "TEO", 50), room(2, "LAB", 20)],
            time_slots: vec![slot(1, 1, 9), slot(2, 1, 11)],
            course_units: vec![course_unit(1, Some(1), &[("T", 2)])],
            classes: vec![class(1, 30, 1, 1), class(2, 10, 1, 1)],
            ..base_snapshot()
        }
    }

    #[test]
    fn accepts_then_rejects_teacher_double_booking() {
        let store = InMemoryCatalog::new(snapshot()).assignment_store();
        assert_eq!(store.try_commit(&request(1, 1, 1, 1)).unwrap(), CommitOutcome::Accepted(1));
        assert_eq!(
            store.try_commit(&request(2, 1, 2, 1)).unwrap(),
            CommitOutcome::Conflict(ConflictKind::TeacherBusy {
                teacher_id: 1,
                slot_id: 1
            })
        );
    }

    #[test]
    fn rejects_room_double_booking() {
        let store = InMemoryCatalog::new(snapshot()).assignment_store();
        store.try_commit(&request(1, 1, 1, 1)).unwrap();
        assert_eq!(
            store.try_commit(&request(2, 2, 1, 1)).unwrap(),
            CommitOutcome::Conflict(ConflictKind::RoomBusy { room_id: 1, slot_id: 1 })
        );
        assert_eq!(store.try_commit(&request(2, 2, 1, 2)).unwrap(), CommitOutcome::Accepted(2));
    }

    #[test]
    fn rejects_under_capacity_room() {
        let store = InMemoryCatalog::new(snapshot()).assignment_store();
        assert_eq!(
            store.try_commit(&request(1, 1, 2, 1)).unwrap(),
            CommitOutcome::CapacityExceeded {
                room_capacity: 20,
                class_size: 30
            }
        );
        assert!(store.active().unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_references() {
        let store = InMemoryCatalog::new(snapshot()).assignment_store();
        let outcome = store.try_commit(&request(1, 9, 1, 1)).unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::InvalidReference("teacher 9 not found".to_string())
        );
        let mut bad_hour_type = request(1, 1, 1, 1);
        bad_hour_type.hour_type_id = Some(42);
        assert!(matches!(
            store.try_commit(&bad_hour_type).unwrap(),
            CommitOutcome::InvalidReference(_)
        ));
    }

    #[test]
    fn deactivation_frees_the_slot() {
        let store = InMemoryCatalog::new(snapshot()).assignment_store();
        store.try_commit(&request(1, 1, 1, 1)).unwrap();
        assert!(store.deactivate(1).unwrap());
        assert!(!store.deactivate(1).unwrap());
        assert_eq!(store.try_commit(&request(2, 1, 1, 1)).unwrap(), CommitOutcome::Accepted(2));
        assert_eq!(store.active().unwrap().len(), 1);
    }

    #[test]
    fn catalog_orders_rooms_slots_and_requirements() {
        let mut snap = snapshot();
        snap.rooms.push(room(3, "LAB", 40));
        snap.rooms.push(Room {
            active: false,
            ..room(4, "TEO", 100)
        });
        snap.time_slots = vec![slot(1, 2, 9), slot(2, 1, 14), slot(3, 1, 9)];
        snap.course_units = vec![course_unit(1, None, &[("TP", 1), ("PL", 2), ("T", 3)])];
        let catalog = InMemoryCatalog::new(snap);

        let rooms: Vec<u32> = catalog.active_rooms().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(rooms, vec![1, 3, 2]);
        let slots: Vec<u32> = catalog.time_slots().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(slots, vec![3, 2, 1]);
        let codes: Vec<String> = catalog
            .hour_requirements(1)
            .unwrap()
            .into_iter()
            .map(|r| r.hour_type.code)
            .collect();
        assert_eq!(codes, vec!["PL", "T", "TP"]);
    }

    #[test]
    fn catalog_filters_classes_by_program() {
        let mut snap = snapshot();
        snap.classes.push(class(3, 10, 1, 2));
        snap.classes.push(ClassUnit {
            active: false,
            ..class(4, 10, 1, 2)
        });
        let catalog = InMemoryCatalog::new(snap);
        let ids = |p| -> Vec<u32> {
            catalog.classes(p).unwrap().iter().map(|c| c.id).collect()
        };
        assert_eq!(ids(None), vec![1, 2, 3]);
        assert_eq!(ids(Some(2)), vec![3]);
        assert!(ids(Some(7)).is_empty());
    }

    #[test]
    fn teacher_lookups() {
        let mut snap = snapshot();
        snap.teachers = vec![
            Teacher {
                active: false,
                ..teacher(1)
            },
            teacher(5),
            teacher(3),
        ];
        let catalog = InMemoryCatalog::new(snap);
        assert_eq!(catalog.responsible_teacher(1).unwrap(), Some(1));
        assert_eq!(catalog.responsible_teacher(99).unwrap(), None);
        assert_eq!(catalog.first_active_teacher().unwrap(), Some(3));
    }

    #[test]
    fn unknown_requirement_code_is_a_store_error() {
        let mut snap = snapshot();
        snap.course_units = vec![course_unit(1, None, &[("XX", 1)])];
        let catalog = InMemoryCatalog::new(snap);
        assert!(matches!(
            catalog.hour_requirements(1),
            Err(StoreError::Internal(_))
        ));
    }

    #[test]
    fn sample_catalog_parses() {
        let snap: CatalogSnapshot =
            serde_json::from_str(include_str!("../data/catalog.json")).unwrap();
        let catalog = InMemoryCatalog::new(snap);
        assert!(!catalog.classes(None).unwrap().is_empty());
        assert!(!catalog.time_slots().unwrap().is_empty());
        assert!(!catalog.active_rooms().unwrap().is_empty());
    }

    #[test]
    fn poisoned_lock_reports_store_unavailable() {
        let store = InMemoryCatalog::new(snapshot()).assignment_store();
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = store.assignments.lock().unwrap();
                    panic!("writer died mid-commit");
                })
                .join();
        });
        assert!(matches!(
            store.try_commit(&request(1, 1, 1, 1)),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(store.active(), Err(StoreError::Unavailable(_))));
    }
}
