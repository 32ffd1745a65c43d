//! Trading signal emitted once per bar by a strategy.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    pub fn is_trade(self) -> bool {
        self != Signal::Hold
    }

    pub fn opposite(self) -> Signal {
        match self {
            Signal::Buy => Signal::Sell,
            Signal::Sell => Signal::Buy,
            Signal::Hold => Signal::Hold,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}
