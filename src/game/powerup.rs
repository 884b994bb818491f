use rand::{seq::IndexedRandom, Rng};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) enum PowerUpKind {
    #[default]
    None,
    /// Shortens the move interval while it lasts
    SlowDown,
    /// Spawns extra apples immediately, and bigger batches under batch respawn
    MultiApple,
    /// Grants a shield that the player can raise to absorb one collision
    Shield,
}

impl PowerUpKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PowerUpKind::None => "None",
            PowerUpKind::SlowDown => "Slow Down",
            PowerUpKind::MultiApple => "Multi-Apple",
            PowerUpKind::Shield => "Shield",
        }
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct PowerUpState {
    pub(crate) kind: PowerUpKind,
    /// Move ticks left before the power-up wears off
    pub(crate) remaining_ticks: u32,
    /// A shield has been granted but not yet raised
    pub(crate) shield_held: bool,
    /// Move ticks left in which a raised shield absorbs a collision
    pub(crate) shield_ticks: u32,
}

impl PowerUpState {
    /// Start a random power-up chosen uniformly from the enabled kinds,
    /// replacing whatever was running.  Returns the new kind.
    pub(crate) fn trigger<R: Rng>(&mut self, rng: &mut R, with_shield: bool, duration: u32) -> PowerUpKind {
        let choices: &[PowerUpKind] = if with_shield {
            &[PowerUpKind::SlowDown, PowerUpKind::MultiApple, PowerUpKind::Shield]
        } else {
            &[PowerUpKind::SlowDown, PowerUpKind::MultiApple]
        };
        let kind = choices.choose(rng).copied().unwrap_or_default();
        self.start(kind, duration);
        kind
    }

    /// Replace the running power-up.  A shield that has already been raised
    /// stays up.
    pub(crate) fn start(&mut self, kind: PowerUpKind, duration: u32) {
        self.kind = kind;
        self.remaining_ticks = duration;
        self.shield_held = kind == PowerUpKind::Shield;
        if duration == 0 {
            self.expire();
        }
    }

    /// Raise a held shield for `window` move ticks.  Returns `false` if no
    /// shield was held.
    pub(crate) fn raise_shield(&mut self, window: u32) -> bool {
        if !self.shield_held || window == 0 {
            return false;
        }
        self.shield_held = false;
        self.shield_ticks = window;
        true
    }

    /// Count down one move tick.  Returns the kind that expired, if any.
    pub(crate) fn tick(&mut self) -> Option<PowerUpKind> {
        self.shield_ticks = self.shield_ticks.saturating_sub(1);
        if self.kind == PowerUpKind::None {
            return None;
        }
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        if self.remaining_ticks == 0 {
            let kind = self.kind;
            self.expire();
            Some(kind)
        } else {
            None
        }
    }

    /// Spend a raised shield on a collision.  Returns `false` if no shield
    /// was up.
    pub(crate) fn absorb(&mut self) -> bool {
        std::mem::take(&mut self.shield_ticks) > 0
    }

    pub(crate) fn shield_active(&self) -> bool {
        self.shield_ticks > 0
    }

    pub(crate) fn is(&self, kind: PowerUpKind) -> bool {
        self.kind == kind
    }

    /// End the power-up.  An unraised shield is lost.
    fn expire(&mut self) {
        self.kind = PowerUpKind::None;
        self.remaining_ticks = 0;
        self.shield_held = false;
    }
}
