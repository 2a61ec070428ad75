//! Hysteresis controller pacing buffer rebalancing.
//!
//! The strategy's limits already form the band: nothing happens while the
//! buffer sits between `low` and `high`, and every action aims at `mid`. The
//! controller adds timing on top: a minimum interval between actions, doubled
//! when the direction flips, so a noisy buffer does not churn the vault.

use rollover_core::{Rebalance, Timestamp};

/// Direction of the last rebalancing action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    None,
    Invest,
    Divest,
}

/// Rebalancing action to execute this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Borrow and invest this much fyToken
    Invest(u128),
    /// Divest this much LP
    Divest(u128),
    Hold,
}

impl Action {
    pub fn direction(&self) -> Direction {
        match self {
            Action::Invest(_) => Direction::Invest,
            Action::Divest(_) => Direction::Divest,
            Action::Hold => Direction::None,
        }
    }
}

impl From<Rebalance> for Action {
    fn from(plan: Rebalance) -> Self {
        match plan {
            Rebalance::Invest(amount) if amount > 0 => Action::Invest(amount),
            Rebalance::Divest(lp) if lp > 0 => Action::Divest(lp),
            _ => Action::Hold,
        }
    }
}

/// Hysteresis controller for buffer rebalancing
#[derive(Debug, Clone)]
pub struct BufferController {
    /// Minimum seconds between actions in the same direction
    pub min_interval: i64,
    /// Last executed action timestamp
    pub last_update: Option<Timestamp>,
    /// Direction of last executed action
    pub last_direction: Direction,
    /// Executed actions
    pub actions: u64,
    /// Planned actions held back by the timing rules
    pub held: u64,
}

impl BufferController {
    pub fn new(min_interval: i64) -> Self {
        Self {
            min_interval,
            last_update: None,
            last_direction: Direction::None,
            actions: 0,
            held: 0,
        }
    }

    /// Seconds to wait after the last action before acting in `direction`
    pub fn cooldown(&self, direction: Direction) -> i64 {
        if self.last_direction != Direction::None && direction != self.last_direction {
            self.min_interval.saturating_mul(2)
        } else {
            self.min_interval
        }
    }

    /// Filter the strategy's plan through the timing rules
    pub fn decide(&mut self, plan: Rebalance, now: Timestamp) -> Action {
        let action = Action::from(plan);
        let direction = action.direction();
        if direction == Direction::None {
            return Action::Hold;
        }

        if let Some(last_update) = self.last_update {
            let elapsed = now - last_update;
            let cooldown = self.cooldown(direction);
            if elapsed < cooldown {
                log::debug!(
                    "Holding {:?}: last action {}s ago, cooldown {}s",
                    action,
                    elapsed,
                    cooldown
                );
                self.held += 1;
                return Action::Hold;
            }
        }

        action
    }

    /// Record an executed action
    pub fn record(&mut self, action: Action, now: Timestamp) {
        let direction = action.direction();
        if direction == Direction::None {
            return;
        }

        if self.last_direction != Direction::None && direction != self.last_direction {
            log::info!("Rebalance direction changed: {:?} -> {:?}", self.last_direction, direction);
        }

        self.last_direction = direction;
        self.last_update = Some(now);
        self.actions += 1;
    }

    /// Get current controller state for monitoring
    pub fn get_state(&self) -> ControllerState {
        ControllerState {
            last_direction: self.last_direction,
            last_update: self.last_update,
            actions: self.actions,
            held: self.held,
        }
    }
}

/// Controller state snapshot for monitoring
#[derive(Debug, Clone)]
pub struct ControllerState {
    pub last_direction: Direction,
    pub last_update: Option<Timestamp>,
    pub actions: u64,
    pub held: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_creation() {
        let controller = BufferController::new(300);
        assert_eq!(controller.last_direction, Direction::None);
        assert_eq!(controller.last_update, None);
        assert_eq!(controller.actions, 0);
    }

    #[test]
    fn test_hold_passes_through() {
        let mut controller = BufferController::new(300);
        assert_eq!(controller.decide(Rebalance::Hold, 1000), Action::Hold);
        assert_eq!(controller.decide(Rebalance::Invest(0), 1000), Action::Hold);
        assert_eq!(controller.held, 0);
    }

    #[test]
    fn test_first_action_is_immediate() {
        let mut controller = BufferController::new(300);
        assert_eq!(controller.decide(Rebalance::Divest(5), 1000), Action::Divest(5));
    }

    #[test]
    fn test_min_interval_same_direction() {
        let mut controller = BufferController::new(300);
        let base_time = 1000;

        let action = controller.decide(Rebalance::Invest(10), base_time);
        controller.record(action, base_time);
        assert_eq!(controller.last_direction, Direction::Invest);

        // Too soon
        assert_eq!(controller.decide(Rebalance::Invest(10), base_time + 299), Action::Hold);
        assert_eq!(controller.held, 1);

        assert_eq!(
            controller.decide(Rebalance::Invest(10), base_time + 300),
            Action::Invest(10)
        );
    }

    #[test]
    fn test_reversal_waits_longer() {
        let mut controller = BufferController::new(300);
        let base_time = 1000;
        controller.record(Action::Invest(10), base_time);

        assert_eq!(controller.decide(Rebalance::Divest(4), base_time + 300), Action::Hold);
        assert_eq!(controller.decide(Rebalance::Divest(4), base_time + 599), Action::Hold);

        let action = controller.decide(Rebalance::Divest(4), base_time + 600);
        assert_eq!(action, Action::Divest(4));
        controller.record(action, base_time + 600);

        let state = controller.get_state();
        assert_eq!(state.last_direction, Direction::Divest);
        assert_eq!(state.last_update, Some(base_time + 600));
        assert_eq!(state.actions, 2);
        assert_eq!(state.held, 2);
    }

    #[test]
    fn test_zero_interval() {
        let mut controller = BufferController::new(0);
        controller.record(Action::Invest(1), 1000);
        assert_eq!(controller.decide(Rebalance::Divest(1), 1000), Action::Divest(1));
    }
}
