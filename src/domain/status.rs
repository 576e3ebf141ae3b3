//! Status enums and transition rules for the fulfillment workflow.
//!
//! Everything here is pure so the lifecycle policies can be tested without a
//! database and tightened without touching the services that call them.

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Ready,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Canceled)
    }

    /// An order in these states has had stock taken out of the products it
    /// references; cancellation must give it back.
    pub fn holds_stock(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            "canceled" => Ok(OrderStatus::Canceled),
            other => Err(AppError::Validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a transition check: re-applying the current status is accepted
/// as a no-op instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Noop,
    Apply,
}

pub fn validate_order_transition(
    current: OrderStatus,
    next: OrderStatus,
) -> Result<Transition, AppError> {
    if current == next {
        return Ok(Transition::Noop);
    }
    use OrderStatus::*;
    let allowed = matches!(
        (current, next),
        (Pending, Processing)
            | (Processing, Ready)
            | (Ready, Completed)
            | (Pending, Canceled)
            | (Processing, Canceled)
    );
    if allowed {
        Ok(Transition::Apply)
    } else {
        Err(AppError::InvalidTransition {
            from: current.as_str().into(),
            to: next.as_str().into(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupStatus {
    Pending,
    Assigned,
    Scheduled,
    InTransit,
    PickedUp,
    Completed,
    Cancelled,
}

impl PickupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Assigned => "assigned",
            PickupStatus::Scheduled => "scheduled",
            PickupStatus::InTransit => "in_transit",
            PickupStatus::PickedUp => "picked_up",
            PickupStatus::Completed => "completed",
            PickupStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for PickupStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PickupStatus::Pending),
            "assigned" => Ok(PickupStatus::Assigned),
            "scheduled" => Ok(PickupStatus::Scheduled),
            "in_transit" => Ok(PickupStatus::InTransit),
            "picked_up" => Ok(PickupStatus::PickedUp),
            "completed" => Ok(PickupStatus::Completed),
            "cancelled" => Ok(PickupStatus::Cancelled),
            other => Err(AppError::Validation(format!(
                "unknown pickup status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses staff/drivers may set directly on a pickup. `assigned` is absent:
/// it is only reachable through driver assignment.
const PICKUP_SETTABLE: [PickupStatus; 6] = [
    PickupStatus::Pending,
    PickupStatus::Scheduled,
    PickupStatus::InTransit,
    PickupStatus::PickedUp,
    PickupStatus::Completed,
    PickupStatus::Cancelled,
];

/// Permissive by design: operations staff routinely revert a pickup (a driver
/// no-show moves `in_transit` back to `scheduled`), so any settable status is
/// reachable from any other. Tightening the policy later only means editing
/// this function.
pub fn validate_pickup_transition(
    current: PickupStatus,
    next: PickupStatus,
) -> Result<Transition, AppError> {
    if !PICKUP_SETTABLE.contains(&next) {
        return Err(AppError::InvalidTransition {
            from: current.as_str().into(),
            to: next.as_str().into(),
        });
    }
    if current == next {
        return Ok(Transition::Noop);
    }
    Ok(Transition::Apply)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverAvailability {
    Available,
    Busy,
    Offline,
}

impl DriverAvailability {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverAvailability::Available => "available",
            DriverAvailability::Busy => "busy",
            DriverAvailability::Offline => "offline",
        }
    }
}

impl FromStr for DriverAvailability {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(DriverAvailability::Available),
            "busy" => Ok(DriverAvailability::Busy),
            "offline" => Ok(DriverAvailability::Offline),
            other => Err(AppError::Validation(format!(
                "unknown availability status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DriverAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Pending,
    Approved,
    Rejected,
    Unavailable,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Approved => "approved",
            ProductStatus::Rejected => "rejected",
            ProductStatus::Unavailable => "unavailable",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProductStatus::Pending),
            "approved" => Ok(ProductStatus::Approved),
            "rejected" => Ok(ProductStatus::Rejected),
            "unavailable" => Ok(ProductStatus::Unavailable),
            other => Err(AppError::Validation(format!(
                "unknown product status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running driver rating after one more rated completion.
///
/// The stored rating folds each new score into the previous average using the
/// pre-increment completion count. This is an average of averages, not the
/// arithmetic mean of the raw scores; downstream reports rely on matching it
/// exactly.
pub fn next_rating(old_rating: f64, old_count: i32, new_rating: f64) -> f64 {
    (old_rating * old_count as f64 + new_rating) / (old_count as f64 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_machine_accepts_forward_path() {
        use OrderStatus::*;
        for (from, to) in [
            (Pending, Processing),
            (Processing, Ready),
            (Ready, Completed),
            (Pending, Canceled),
            (Processing, Canceled),
        ] {
            assert_eq!(
                validate_order_transition(from, to).unwrap(),
                Transition::Apply,
                "{from} -> {to} should be allowed"
            );
        }
    }

    #[test]
    fn order_machine_rejects_everything_else() {
        use OrderStatus::*;
        for (from, to) in [
            (Completed, Pending),
            (Canceled, Pending),
            (Ready, Canceled),
            (Ready, Processing),
            (Pending, Ready),
            (Pending, Completed),
            (Processing, Completed),
            (Completed, Canceled),
        ] {
            assert!(
                matches!(
                    validate_order_transition(from, to),
                    Err(AppError::InvalidTransition { .. })
                ),
                "{from} -> {to} should be rejected"
            );
        }
    }

    #[test]
    fn order_machine_same_status_is_noop() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Ready,
            OrderStatus::Completed,
            OrderStatus::Canceled,
        ] {
            assert_eq!(
                validate_order_transition(status, status).unwrap(),
                Transition::Noop
            );
        }
    }

    #[test]
    fn pickup_machine_allows_any_settable_target() {
        // Reversions are deliberately legal, completed -> pending included.
        assert_eq!(
            validate_pickup_transition(PickupStatus::Completed, PickupStatus::Pending).unwrap(),
            Transition::Apply
        );
        assert_eq!(
            validate_pickup_transition(PickupStatus::InTransit, PickupStatus::Scheduled).unwrap(),
            Transition::Apply
        );
        assert_eq!(
            validate_pickup_transition(PickupStatus::Assigned, PickupStatus::InTransit).unwrap(),
            Transition::Apply
        );
    }

    #[test]
    fn pickup_machine_rejects_assigned_as_target() {
        assert!(matches!(
            validate_pickup_transition(PickupStatus::Pending, PickupStatus::Assigned),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn status_parsing_round_trips() {
        assert_eq!(
            "in_transit".parse::<PickupStatus>().unwrap(),
            PickupStatus::InTransit
        );
        assert_eq!(
            "available".parse::<DriverAvailability>().unwrap(),
            DriverAvailability::Available
        );
        assert!("express".parse::<DriverAvailability>().is_err());
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn rating_folds_with_pre_increment_count() {
        // Scores 5, 3, 4 folded in sequence from a fresh driver.
        let r1 = next_rating(0.0, 0, 5.0);
        assert_eq!(r1, 5.0);
        let r2 = next_rating(r1, 1, 3.0);
        assert_eq!(r2, 4.0);
        let r3 = next_rating(r2, 2, 4.0);
        assert!((r3 - 4.0).abs() < f64::EPSILON);

        // The fold consumes the stored average, not the raw score history.
        let folded = next_rating(4.0, 3, 2.0);
        assert!((folded - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unrated_completions_weigh_down_later_ratings() {
        // Two completions without a rating leave the stored rating at 0 with
        // count 2; a later 5-star score lands at (0*2+5)/3, not 5. This is
        // the preserved source formula, not the mean of submitted ratings.
        let rating = next_rating(0.0, 2, 5.0);
        assert!((rating - 5.0 / 3.0).abs() < f64::EPSILON);
    }
}
