use crate::config::SessionCap;
use crate::data::{ClassUnit, HourType, HourTypeRequirement, SessionRequest};
use crate::error::DecomposeError;
use log::debug;

/// Turns a class's hour requirements into the sessions to place this run.
///
/// One request per hour type, `clamp(hours, 1, cap)` each, in the order the
/// requirements are given. Without requirements a single session of the
/// default hour type is requested; `default_hour_type` is that type as found
/// in the catalog (`None` if missing). When the total exceeds `cap` the
/// quantities are cut left to right until they sum to `cap` exactly.
pub fn decompose(
    class: &ClassUnit,
    requirements: &[HourTypeRequirement],
    default_code: &str,
    default_hour_type: Option<&HourType>,
    cap: SessionCap,
) -> Result<Vec<SessionRequest>, DecomposeError> {
    if requirements.is_empty() {
        let hour_type = default_hour_type
            .ok_or_else(|| DecomposeError::MissingDefaultHourType(default_code.to_string()))?;
        return Ok(vec![SessionRequest {
            class_id: class.id,
            hour_type: hour_type.clone(),
            quantity: 1,
        }]);
    }

    let requests: Vec<SessionRequest> = requirements
        .iter()
        .map(|r| SessionRequest {
            class_id: class.id,
            hour_type: r.hour_type.clone(),
            quantity: r.hours.clamp(1, cap.get()),
        })
        .collect();

    Ok(truncate_to_cap(requests, cap))
}

fn truncate_to_cap(requests: Vec<SessionRequest>, cap: SessionCap) -> Vec<SessionRequest> {
    let total: u32 = requests.iter().map(|r| r.quantity).sum();
    if total <= cap.get() {
        return requests;
    }
    debug!("Requested {} sessions, truncating to {}", total, cap.get());

    let mut budget = cap.get();
    requests
        .into_iter()
        .filter_map(|mut r| {
            r.quantity = r.quantity.min(budget);
            budget -= r.quantity;
            (r.quantity > 0).then_some(r)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fixtures::{class, hour_type};

    fn requirement(id: u32, code: &str, hours: u32) -> HourTypeRequirement {
        HourTypeRequirement {
            hour_type: hour_type(id, code),
            hours,
        }
    }

    fn quantities(requests: &[SessionRequest]) -> Vec<(&str, u32)> {
        requests
            .iter()
            .map(|r| (r.hour_type.code.as_str(), r.quantity))
            .collect()
    }

    fn cap(value: u32) -> SessionCap {
        SessionCap::new(value).unwrap()
    }

    #[test]
    fn one_request_per_hour_type() {
        let reqs = [requirement(3, "PL", 2), requirement(1, "T", 3)];
        let out = decompose(&class(1, 20, 1, 1), &reqs, "T", None, cap(10)).unwrap();
        assert_eq!(quantities(&out), vec![("PL", 2), ("T", 3)]);
        assert!(out.iter().all(|r| r.class_id == 1));
    }

    #[test]
    fn zero_hours_still_yield_one_session() {
        let reqs = [requirement(1, "T", 0)];
        let out = decompose(&class(1, 20, 1, 1), &reqs, "T", None, cap(10)).unwrap();
        assert_eq!(quantities(&out), vec![("T", 1)]);
    }

    #[test]
    fn single_requirement_clamped_to_cap() {
        let reqs = [requirement(1, "T", 30)];
        let out = decompose(&class(1, 20, 1, 1), &reqs, "T", None, cap(4)).unwrap();
        assert_eq!(quantities(&out), vec![("T", 4)]);
    }

    #[test]
    fn truncation_is_left_to_right() {
        let reqs = [
            requirement(3, "PL", 4),
            requirement(1, "T", 4),
            requirement(2, "TP", 4),
        ];
        let out = decompose(&class(1, 20, 1, 1), &reqs, "T", None, cap(6)).unwrap();
        assert_eq!(quantities(&out), vec![("PL", 4), ("T", 2)]);
    }

    #[test]
    fn truncated_total_equals_cap() {
        for c in 1..=12 {
            let reqs = [
                requirement(3, "PL", 5),
                requirement(1, "T", 3),
                requirement(2, "TP", 4),
            ];
            let out = decompose(&class(1, 20, 1, 1), &reqs, "T", None, cap(c)).unwrap();
            let total: u32 = out.iter().map(|r| r.quantity).sum();
            assert_eq!(total, c, "cap {c}");
        }
    }

    #[test]
    fn fallback_uses_default_hour_type() {
        let theory = hour_type(1, "T");
        let out = decompose(&class(7, 20, 1, 1), &[], "T", Some(&theory), cap(10)).unwrap();
        assert_eq!(
            out,
            vec![SessionRequest {
                class_id: 7,
                hour_type: theory,
                quantity: 1
            }]
        );
    }

    #[test]
    fn fallback_without_default_hour_type_fails() {
        let err = decompose(&class(7, 20, 1, 1), &[], "T", None, cap(10)).unwrap_err();
        assert_eq!(err, DecomposeError::MissingDefaultHourType("T".to_string()));
    }
}
