use crate::config::{GenerationConfig, SessionCap};
use crate::data::{
    AssignmentId, AssignmentRequest, ClassUnit, ProgramId, Room, SessionRequest, TeacherId,
    TimeSlot,
};
use crate::decompose::decompose;
use crate::error::{GenerateError, StoreError};
use crate::ordering::{order_rooms, order_slots};
use crate::report::{GenerationReport, NO_CANDIDATE_REASON, OutcomeAggregator};
use crate::store::{AssignmentStore, CatalogStore, CommitOutcome};
use itertools::Itertools;
use log::{debug, info, trace, warn};
use std::time::Instant;

pub const NO_TEACHER_REASON: &str =
    "no teacher available (course unit has no responsible teacher and no teacher is active)";

/// What the caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub program: Option<ProgramId>,
    pub cap: SessionCap,
}

/// Every (slot, room) candidate, slot-major: all rooms of the first slot,
/// then all rooms of the next.
pub fn candidates<'a>(
    slots: &'a [&'a TimeSlot],
    rooms: &'a [&'a Room],
) -> impl Iterator<Item = (&'a TimeSlot, &'a Room)> + 'a {
    slots
        .iter()
        .copied()
        .cartesian_product(rooms.iter().copied())
}

/// Greedy first-fit timetable generator.
///
/// Proposes assignments to the store one candidate at a time and keeps the
/// first one accepted. It never checks conflicts itself and never revisits a
/// committed session.
pub struct Generator<'a, C: ?Sized, A: ?Sized> {
    catalog: &'a C,
    store: &'a A,
    config: &'a GenerationConfig,
}

impl<'a, C, A> Generator<'a, C, A>
where
    C: CatalogStore + ?Sized,
    A: AssignmentStore + ?Sized,
{
    pub fn new(catalog: &'a C, store: &'a A, config: &'a GenerationConfig) -> Self {
        Self {
            catalog,
            store,
            config,
        }
    }

    /// Runs one generation pass. `run_id` tags the notes of created assignments.
    ///
    /// Only an unavailable catalog and a catalog without slots or active rooms
    /// abort the run; everything else lands in the report.
    pub fn run(
        &self,
        run_id: u64,
        request: &GenerationRequest,
    ) -> Result<GenerationReport, GenerateError> {
        let start_time = Instant::now();

        let classes = self.catalog.classes(request.program)?;
        if classes.is_empty() {
            info!("Run {run_id}: no classes to generate");
            return Ok(GenerationReport::empty("no classes to generate"));
        }

        let slots = self.catalog.time_slots()?;
        if slots.is_empty() {
            return Err(GenerateError::NoTimeSlots);
        }
        let rooms = self.catalog.active_rooms()?;
        if rooms.is_empty() {
            return Err(GenerateError::NoActiveRooms);
        }
        let slots = order_slots(&slots);
        let default_hour_type = self
            .catalog
            .hour_type_by_code(&self.config.default_hour_type)?;

        info!(
            "Run {run_id}: generating for {} classes over {} slots and {} rooms (cap {})",
            classes.len(),
            slots.len(),
            rooms.len(),
            request.cap.get()
        );

        let mut outcomes = OutcomeAggregator::new();
        for class in &classes {
            outcomes.begin_class(class);

            let teacher = match self.resolve_teacher(class) {
                Ok(Some(teacher)) => teacher,
                Ok(None) => {
                    warn!("Class {}: {}", class.id, NO_TEACHER_REASON);
                    outcomes.record_class_error(NO_TEACHER_REASON);
                    continue;
                }
                Err(e @ StoreError::Internal(_)) => {
                    warn!("Class {}: {}", class.id, e);
                    outcomes.record_class_error(e.to_string());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            // Bad catalog data for one course unit fails only its classes.
            let requirements = match self.catalog.hour_requirements(class.course_unit_id) {
                Ok(requirements) => requirements,
                Err(e @ StoreError::Internal(_)) => {
                    warn!("Class {}: {}", class.id, e);
                    outcomes.record_class_error(e.to_string());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let sessions = match decompose(
                class,
                &requirements,
                &self.config.default_hour_type,
                default_hour_type.as_ref(),
                request.cap,
            ) {
                Ok(sessions) => sessions,
                Err(e) => {
                    warn!("Class {}: {}", class.id, e);
                    outcomes.record_class_error(e.to_string());
                    continue;
                }
            };

            for session in &sessions {
                self.place_session(run_id, class, teacher, session, &slots, &rooms, &mut outcomes);
            }
        }

        let report = outcomes.finish();
        info!(
            "Run {run_id}: created {} sessions for {} classes ({} units unplaced) in {:.2?}",
            report.created,
            report.classes_processed,
            report.failed_units(),
            start_time.elapsed()
        );
        Ok(report)
    }

    /// The course unit's responsible teacher, else the first active one.
    fn resolve_teacher(&self, class: &ClassUnit) -> Result<Option<TeacherId>, StoreError> {
        match self.catalog.responsible_teacher(class.course_unit_id)? {
            Some(teacher) => Ok(Some(teacher)),
            None => self.catalog.first_active_teacher(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place_session(
        &self,
        run_id: u64,
        class: &ClassUnit,
        teacher: TeacherId,
        session: &SessionRequest,
        slots: &[&TimeSlot],
        rooms: &[Room],
        outcomes: &mut OutcomeAggregator,
    ) {
        let code = session.hour_type.code.as_str();
        let rooms = order_rooms(rooms, code, self.config);
        let note = format!(
            "Generated automatically (run {run_id} / {} / {} / {code})",
            class.program_code, class.course_unit_code
        );

        for unit in 0..session.quantity {
            match self.place_unit(class, teacher, session, &note, slots, &rooms) {
                Ok(Some(id)) => {
                    debug!(
                        "Class {} {code} unit {}/{}: assignment {id}",
                        class.id,
                        unit + 1,
                        session.quantity
                    );
                    outcomes.record_placed();
                }
                Ok(None) => {
                    debug!("Class {} {code} unit {}: no candidate accepted", class.id, unit + 1);
                    outcomes.record_failure(code, NO_CANDIDATE_REASON);
                }
                Err(e) => {
                    warn!("Class {} {code} unit {}: {}", class.id, unit + 1, e);
                    outcomes.record_failure(code, e.to_string());
                }
            }
        }
    }

    /// Tries candidates in order until the store accepts one.
    fn place_unit(
        &self,
        class: &ClassUnit,
        teacher: TeacherId,
        session: &SessionRequest,
        note: &str,
        slots: &[&TimeSlot],
        rooms: &[&Room],
    ) -> Result<Option<AssignmentId>, StoreError> {
        for (slot, room) in candidates(slots, rooms) {
            let request = AssignmentRequest {
                class_id: session.class_id,
                teacher_id: teacher,
                room_id: room.id,
                slot_id: slot.id,
                hour_type_id: Some(session.hour_type.id),
                note: Some(note.to_string()),
            };
            match self.store.try_commit(&request)? {
                CommitOutcome::Accepted(id) => return Ok(Some(id)),
                rejected => {
                    trace!("Class {} at {slot} in room {}: {rejected}", class.id, room.id);
                }
            }
        }
        Ok(None)
    }
}
