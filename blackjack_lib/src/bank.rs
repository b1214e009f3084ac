use crate::error::BankError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A running balance with totals of everything credited and debited over its life.
/// A debit may never take the balance below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    name: String,
    balance: f64,
    credited: f64,
    debited: f64,
}

impl Bank {
    pub fn new<S: Into<String>>(name: S, balance: f64) -> Bank {
        Bank {
            name: name.into(),
            balance,
            credited: 0.0,
            debited: 0.0,
        }
    }

    /// A zero balance account, used for stakes and insurance wagers.
    pub fn empty<S: Into<String>>(name: S) -> Bank {
        Bank::new(name, 0.0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn is_empty(&self) -> bool {
        self.balance == 0.0
    }

    pub fn total_credited(&self) -> f64 {
        self.credited
    }

    pub fn total_debited(&self) -> f64 {
        self.debited
    }

    pub fn can_afford(&self, amount: f64) -> bool {
        amount <= self.balance
    }

    fn check_amount(amount: f64) -> Result<(), BankError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(BankError::InvalidAmount(amount));
        }
        Ok(())
    }

    pub fn credit(&mut self, amount: f64) -> Result<(), BankError> {
        Bank::check_amount(amount)?;
        self.balance += amount;
        self.credited += amount;
        Ok(())
    }

    pub fn debit(&mut self, amount: f64) -> Result<(), BankError> {
        Bank::check_amount(amount)?;
        if amount > self.balance {
            return Err(BankError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.debited += amount;
        Ok(())
    }

    /// Moves `amount` from `self` into `to`. Either both sides change or neither does.
    pub fn transfer_to(&mut self, to: &mut Bank, amount: f64) -> Result<(), BankError> {
        self.debit(amount)?;
        log::trace!("{} -> {}: {:.2}", self.name, to.name, amount);
        to.credit(amount)
    }

    /// Moves the whole balance of `self` into `to`, returning the amount moved.
    pub fn drain_to(&mut self, to: &mut Bank) -> Result<f64, BankError> {
        let amount = self.balance;
        self.transfer_to(to, amount)?;
        Ok(amount)
    }

    /// Overwrites the balance, used when a simulation restarts with fresh bankrolls.
    pub fn reset(&mut self, balance: f64) {
        self.balance = balance;
        self.credited = 0.0;
        self.debited = 0.0;
    }
}

impl Display for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ${:.2}", self.name, self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_money() {
        let mut player = Bank::new("player", 100.0);
        let mut stake = Bank::empty("stake");
        player.transfer_to(&mut stake, 25.0).unwrap();
        assert_eq!(player.balance(), 75.0);
        assert_eq!(stake.balance(), 25.0);
        assert_eq!(player.total_debited(), 25.0);
        assert_eq!(stake.total_credited(), 25.0);
    }

    #[test]
    fn overdraw_is_rejected_without_side_effects() {
        let mut player = Bank::new("player", 10.0);
        let mut stake = Bank::empty("stake");
        let err = player.transfer_to(&mut stake, 10.5).unwrap_err();
        assert_eq!(
            err,
            BankError::InsufficientFunds {
                requested: 10.5,
                available: 10.0
            }
        );
        assert_eq!(player.balance(), 10.0);
        assert!(stake.is_empty());
    }

    #[test]
    fn negative_amounts_are_invalid() {
        let mut bank = Bank::new("house", 10.0);
        assert_eq!(bank.credit(-1.0), Err(BankError::InvalidAmount(-1.0)));
        assert!(bank.debit(f64::NAN).is_err());
    }

    #[test]
    fn drain_empties_account() {
        let mut stake = Bank::new("stake", 15.0);
        let mut player = Bank::empty("player");
        assert_eq!(stake.drain_to(&mut player).unwrap(), 15.0);
        assert!(stake.is_empty());
        assert_eq!(player.balance(), 15.0);
    }
}
