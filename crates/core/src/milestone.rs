//! Milestones and the fixed notification routing table.
//!
//! A milestone is the semantic name of a status actually reached. Most
//! transitions produce the generic `status_changed` milestone; a handful
//! of operationally meaningful transitions produce a special milestone
//! instead, which suppresses the generic one for that transition.
//!
//! Who gets told about which milestone is a single exhaustive table here,
//! not per-caller conditionals; the double-notification bugs in this
//! domain come from scattering that decision across call sites.

use serde::{Deserialize, Serialize};

use crate::status::{BookingStatus, JobStatus};
use crate::types::EntityKind;

// ---------------------------------------------------------------------------
// Milestone
// ---------------------------------------------------------------------------

/// A notable point reached by a Booking or Job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    /// Generic status-changed milestone; carries the new status.
    StatusChanged,
    /// A driver was assigned and the booking scheduled, in the same call.
    DriverAssigned,
    /// The driver is on the way to the collection address.
    DriverEnRoute,
    /// The driver has arrived at the collection address.
    DriverArrived,
    /// Goods were received at the warehouse intake point.
    GoodsReceived,
}

impl Milestone {
    /// Stable string form, matching the `workflow_events.milestone` and
    /// `notifications.milestone` columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            Milestone::StatusChanged => "status_changed",
            Milestone::DriverAssigned => "driver_assigned",
            Milestone::DriverEnRoute => "driver_en_route",
            Milestone::DriverArrived => "driver_arrived",
            Milestone::GoodsReceived => "goods_received",
        }
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The special milestone implied by a Job reaching `status`, if any.
///
/// When this returns `Some`, that milestone replaces the generic
/// `status_changed` for the transition. Booking-side special milestones
/// exist only on the driver-assignment path and are chosen by the caller,
/// not derived from the status alone.
pub fn special_job_milestone(status: JobStatus) -> Option<Milestone> {
    match status {
        JobStatus::EnRoute => Some(Milestone::DriverEnRoute),
        JobStatus::Arrived => Some(Milestone::DriverArrived),
        JobStatus::Warehouse => Some(Milestone::GoodsReceived),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Roles & routing
// ---------------------------------------------------------------------------

/// Human actors that can receive workflow notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Reseller,
    Driver,
    Admin,
}

impl Role {
    /// Stable string form, matching the `notifications.role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Reseller => "reseller",
            Role::Driver => "driver",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which roles are notified when a Booking reaches `status` with `milestone`.
pub fn booking_roles_to_notify(status: BookingStatus, milestone: Milestone) -> &'static [Role] {
    if milestone == Milestone::DriverAssigned {
        // Scheduling with a driver in the same call tells the client who is
        // coming and tells the driver about the route.
        return &[Role::Client, Role::Driver];
    }
    match status {
        BookingStatus::Pending => &[Role::Admin],
        BookingStatus::Created => &[Role::Client, Role::Admin],
        BookingStatus::Scheduled => &[Role::Client],
        // The customer-facing collected/sanitised/graded milestones are
        // driven from the job side; the booking echo stays quiet except
        // toward the client view.
        BookingStatus::Collected => &[Role::Client],
        BookingStatus::Sanitised => &[Role::Client],
        BookingStatus::Graded => &[Role::Client, Role::Reseller],
        BookingStatus::Completed => &[Role::Client, Role::Admin],
        BookingStatus::Cancelled => &[Role::Client, Role::Driver, Role::Admin],
    }
}

/// Which roles are notified when a Job reaches `status` with `milestone`.
pub fn job_roles_to_notify(status: JobStatus, milestone: Milestone) -> &'static [Role] {
    match milestone {
        Milestone::DriverEnRoute => &[Role::Client],
        Milestone::DriverArrived => &[Role::Client],
        Milestone::GoodsReceived => &[Role::Client, Role::Reseller, Role::Admin],
        _ => match status {
            JobStatus::Booked => &[Role::Admin],
            JobStatus::Routed => &[Role::Driver],
            // en_route / arrived / warehouse always arrive here with their
            // special milestone; the generic arms stay empty so a stray
            // generic emission cannot double-notify.
            JobStatus::EnRoute | JobStatus::Arrived | JobStatus::Warehouse => &[],
            JobStatus::Collected => &[Role::Client, Role::Admin],
            JobStatus::Sanitised => &[Role::Client, Role::Reseller],
            JobStatus::Graded => &[Role::Client, Role::Reseller],
            JobStatus::Completed => &[Role::Client, Role::Reseller, Role::Admin],
            JobStatus::Cancelled => &[Role::Client, Role::Driver, Role::Admin],
        },
    }
}

/// Convenience wrapper over the two per-entity tables.
pub fn roles_to_notify(
    kind: EntityKind,
    status_str: &str,
    milestone: Milestone,
) -> &'static [Role] {
    match kind {
        EntityKind::Booking => BookingStatus::parse(status_str)
            .map(|s| booking_roles_to_notify(s, milestone))
            .unwrap_or(&[]),
        EntityKind::Job => JobStatus::parse(status_str)
            .map(|s| job_roles_to_notify(s, milestone))
            .unwrap_or(&[]),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_milestones_cover_exactly_three_job_statuses() {
        for &s in JobStatus::ALL {
            let expected = matches!(
                s,
                JobStatus::EnRoute | JobStatus::Arrived | JobStatus::Warehouse
            );
            assert_eq!(special_job_milestone(s).is_some(), expected, "{s}");
        }
    }

    #[test]
    fn goods_received_notifies_client_reseller_admin() {
        let roles = job_roles_to_notify(JobStatus::Warehouse, Milestone::GoodsReceived);
        assert_eq!(roles, &[Role::Client, Role::Reseller, Role::Admin][..]);
    }

    #[test]
    fn en_route_and_arrived_notify_client_only() {
        assert_eq!(
            job_roles_to_notify(JobStatus::EnRoute, Milestone::DriverEnRoute),
            &[Role::Client][..]
        );
        assert_eq!(
            job_roles_to_notify(JobStatus::Arrived, Milestone::DriverArrived),
            &[Role::Client][..]
        );
    }

    #[test]
    fn generic_arms_for_special_statuses_are_empty() {
        // A generic emission for these statuses must notify nobody; the
        // special milestone is the only way anyone hears about them.
        for s in [JobStatus::EnRoute, JobStatus::Arrived, JobStatus::Warehouse] {
            assert!(job_roles_to_notify(s, Milestone::StatusChanged).is_empty(), "{s}");
        }
    }

    #[test]
    fn driver_assigned_overrides_scheduled_routing() {
        assert_eq!(
            booking_roles_to_notify(BookingStatus::Scheduled, Milestone::DriverAssigned),
            &[Role::Client, Role::Driver][..]
        );
        // Any other path to scheduled gets the plain client notification.
        assert_eq!(
            booking_roles_to_notify(BookingStatus::Scheduled, Milestone::StatusChanged),
            &[Role::Client][..]
        );
    }

    #[test]
    fn every_status_milestone_pair_has_a_routing_entry() {
        // Exhaustive: the table is total. An unknown pair returning an
        // empty slice is acceptable; a panic is not.
        for &s in BookingStatus::ALL {
            for m in [
                Milestone::StatusChanged,
                Milestone::DriverAssigned,
                Milestone::DriverEnRoute,
                Milestone::DriverArrived,
                Milestone::GoodsReceived,
            ] {
                let _ = booking_roles_to_notify(s, m);
            }
        }
        for &s in JobStatus::ALL {
            for m in [
                Milestone::StatusChanged,
                Milestone::DriverAssigned,
                Milestone::DriverEnRoute,
                Milestone::DriverArrived,
                Milestone::GoodsReceived,
            ] {
                let _ = job_roles_to_notify(s, m);
            }
        }
    }

    #[test]
    fn roles_to_notify_parses_status_strings() {
        let roles = roles_to_notify(EntityKind::Job, "warehouse", Milestone::GoodsReceived);
        assert_eq!(roles.len(), 3);
        assert!(roles_to_notify(EntityKind::Booking, "no_such", Milestone::StatusChanged).is_empty());
    }

    #[test]
    fn cancellation_notifies_everyone_involved() {
        assert_eq!(
            booking_roles_to_notify(BookingStatus::Cancelled, Milestone::StatusChanged),
            &[Role::Client, Role::Driver, Role::Admin][..]
        );
        assert_eq!(
            job_roles_to_notify(JobStatus::Cancelled, Milestone::StatusChanged),
            &[Role::Client, Role::Driver, Role::Admin][..]
        );
    }
}
