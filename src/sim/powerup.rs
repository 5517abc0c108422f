//! Power-ups active during a session

use serde::{Deserialize, Serialize};

/// Power-up types (bought in the shop, granted by ranks or mystery balloons)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    /// Pulls nearby balloons toward the pointer
    Magnet,
    DoubleScore,
    /// Absorbs one bomb
    Shield,
    #[serde(rename = "slowmo")]
    SlowMo,
    /// Pops a handful of balloons automatically
    AutoPopBonus,
    CoinMagnet,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::Magnet,
        PowerUpKind::DoubleScore,
        PowerUpKind::Shield,
        PowerUpKind::SlowMo,
        PowerUpKind::AutoPopBonus,
        PowerUpKind::CoinMagnet,
    ];

    /// Timed duration, `None` for one-shot power-ups
    pub fn duration_ms(self) -> Option<f32> {
        match self {
            PowerUpKind::Magnet => Some(8_000.0),
            PowerUpKind::DoubleScore => Some(15_000.0),
            PowerUpKind::SlowMo => Some(10_000.0),
            PowerUpKind::CoinMagnet => Some(20_000.0),
            PowerUpKind::Shield | PowerUpKind::AutoPopBonus => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PowerUpKind::Magnet => "magnet",
            PowerUpKind::DoubleScore => "doubleScore",
            PowerUpKind::Shield => "shield",
            PowerUpKind::SlowMo => "slowmo",
            PowerUpKind::AutoPopBonus => "autoPopBonus",
            PowerUpKind::CoinMagnet => "coinMagnet",
        }
    }
}

/// Remaining time of each timed power-up (ms) plus the shield flag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivePowerUps {
    pub magnet_ms: f32,
    pub double_score_ms: f32,
    pub slowmo_ms: f32,
    pub coin_magnet_ms: f32,
    pub shield: bool,
}

impl ActivePowerUps {
    /// Start (or refresh) a timed power-up. One-shots are handled by the caller.
    pub fn start(&mut self, kind: PowerUpKind) {
        let Some(ms) = kind.duration_ms() else {
            if kind == PowerUpKind::Shield {
                self.shield = true;
            }
            return;
        };
        let slot = match kind {
            PowerUpKind::Magnet => &mut self.magnet_ms,
            PowerUpKind::DoubleScore => &mut self.double_score_ms,
            PowerUpKind::SlowMo => &mut self.slowmo_ms,
            PowerUpKind::CoinMagnet => &mut self.coin_magnet_ms,
            PowerUpKind::Shield | PowerUpKind::AutoPopBonus => return,
        };
        *slot = slot.max(ms);
    }

    /// Count down timers. Returns the power-ups that just ran out.
    pub fn advance(&mut self, dt_ms: f32) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        for (kind, slot) in [
            (PowerUpKind::Magnet, &mut self.magnet_ms),
            (PowerUpKind::DoubleScore, &mut self.double_score_ms),
            (PowerUpKind::SlowMo, &mut self.slowmo_ms),
            (PowerUpKind::CoinMagnet, &mut self.coin_magnet_ms),
        ] {
            if *slot > 0.0 {
                *slot -= dt_ms;
                if *slot <= 0.0 {
                    *slot = 0.0;
                    expired.push(kind);
                }
            }
        }
        expired
    }

    /// Consume the shield if one is up
    pub fn take_shield(&mut self) -> bool {
        std::mem::replace(&mut self.shield, false)
    }

    pub fn magnet(&self) -> bool {
        self.magnet_ms > 0.0
    }

    pub fn double_score(&self) -> bool {
        self.double_score_ms > 0.0
    }

    pub fn slowmo(&self) -> bool {
        self.slowmo_ms > 0.0
    }

    pub fn coin_magnet(&self) -> bool {
        self.coin_magnet_ms > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_powerup_expires() {
        let mut active = ActivePowerUps::default();
        active.start(PowerUpKind::DoubleScore);
        assert!(active.double_score());
        assert!(active.advance(14_000.0).is_empty());
        assert_eq!(active.advance(1_000.0), vec![PowerUpKind::DoubleScore]);
        assert!(!active.double_score());
    }

    #[test]
    fn test_restart_does_not_shorten() {
        let mut active = ActivePowerUps::default();
        active.start(PowerUpKind::Magnet);
        active.advance(1_000.0);
        active.start(PowerUpKind::Magnet);
        assert_eq!(active.magnet_ms, 8_000.0);
    }

    #[test]
    fn test_shield_is_consumed_once() {
        let mut active = ActivePowerUps::default();
        active.start(PowerUpKind::Shield);
        assert!(active.take_shield());
        assert!(!active.take_shield());
    }
}
