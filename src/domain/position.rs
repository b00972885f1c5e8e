//! Per-symbol cash and share holdings.

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub cash: f64,
    pub shares: f64,
    pub avg_cost: f64,
}

/// Outcome of [`Position::remove_shares`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sale {
    pub shares_sold: f64,
    pub gross_proceeds: f64,
    pub net_proceeds: f64,
    pub realized_pnl: f64,
}

impl Position {
    pub fn new(cash: f64) -> Self {
        Position {
            cash,
            shares: 0.0,
            avg_cost: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.shares <= 0.0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.market_value(price)
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares * (price - self.avg_cost)
    }

    /// Adds `shares` paid for with `cost` (commission included) and re-weights
    /// the average cost per share.
    pub fn add_shares(&mut self, shares: f64, cost: f64) {
        let shares_after = self.shares + shares;
        if shares_after > 0.0 {
            self.avg_cost = (self.avg_cost * self.shares + cost) / shares_after;
        }
        self.shares = shares_after;
        self.cash -= cost;
    }

    /// Sells up to `requested` shares at `price`, net of `commission_rate`.
    /// The average cost is left untouched. Selling from a flat position is a
    /// no-op with zero realized P&L.
    pub fn remove_shares(&mut self, requested: f64, price: f64, commission_rate: f64) -> Sale {
        let shares_sold = requested.min(self.shares).max(0.0);
        let gross_proceeds = shares_sold * price;
        let net_proceeds = gross_proceeds * (1.0 - commission_rate);
        let realized_pnl = net_proceeds - shares_sold * self.avg_cost;

        self.shares -= shares_sold;
        self.cash += net_proceeds;

        Sale {
            shares_sold,
            gross_proceeds,
            net_proceeds,
            realized_pnl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_position_is_flat() {
        let pos = Position::new(1_000_000.0);
        assert!(pos.is_flat());
        assert_relative_eq!(pos.equity(123.0), 1_000_000.0);
    }

    #[test]
    fn add_shares_weights_avg_cost() {
        let mut pos = Position::new(10_000.0);
        pos.add_shares(10.0, 1_000.0);
        assert_relative_eq!(pos.avg_cost, 100.0);
        pos.add_shares(10.0, 2_000.0);
        assert_relative_eq!(pos.avg_cost, 150.0);
        assert_relative_eq!(pos.shares, 20.0);
        assert_relative_eq!(pos.cash, 7_000.0);
    }

    #[test]
    fn remove_shares_realizes_against_avg_cost() {
        let mut pos = Position {
            cash: 0.0,
            shares: 1_000.0,
            avg_cost: 50.0,
        };
        let c = 0.0001;
        let sale = pos.remove_shares(10.0, 60.0, c);
        assert_relative_eq!(sale.shares_sold, 10.0);
        assert_relative_eq!(sale.gross_proceeds, 600.0);
        assert_relative_eq!(sale.net_proceeds, 600.0 * (1.0 - c));
        assert_relative_eq!(sale.realized_pnl, 600.0 * (1.0 - c) - 500.0);
        assert_relative_eq!(pos.avg_cost, 50.0);
        assert_relative_eq!(pos.shares, 990.0);
        assert_relative_eq!(pos.cash, 600.0 * (1.0 - c));
    }

    #[test]
    fn remove_more_than_held_is_capped() {
        let mut pos = Position {
            cash: 0.0,
            shares: 5.0,
            avg_cost: 10.0,
        };
        let sale = pos.remove_shares(8.0, 12.0, 0.0);
        assert_relative_eq!(sale.shares_sold, 5.0);
        assert_relative_eq!(sale.realized_pnl, 10.0);
        assert!(pos.is_flat());
    }

    #[test]
    fn remove_from_flat_is_noop() {
        let mut pos = Position::new(500.0);
        let sale = pos.remove_shares(3.0, 10.0, 0.001);
        assert_eq!(sale.shares_sold, 0.0);
        assert_eq!(sale.realized_pnl, 0.0);
        assert_eq!(pos, Position::new(500.0));
    }

    #[test]
    fn unrealized_pnl() {
        let pos = Position {
            cash: 0.0,
            shares: 100.0,
            avg_cost: 50.0,
        };
        assert_relative_eq!(pos.unrealized_pnl(55.0), 500.0);
        assert_relative_eq!(pos.market_value(55.0), 5_500.0);
    }
}
