use ethers::types::{Address, U256};
use std::collections::HashMap;

/// ERC-20 call surface across every token the settlement touches, keyed by
/// token address. Mirrors the token contracts' semantics: a refused
/// movement is reported as `false`, never as a panic.
pub trait TokenLedger {
    fn balance_of(&self, token: Address, owner: Address) -> U256;

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256;

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> bool;

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> bool;

    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) -> bool;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InMemoryLedger {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, token: Address, to: Address, amount: U256) {
        let balance = self.balances.entry((token, to)).or_default();
        *balance = balance.saturating_add(amount);
    }

    fn debit(&mut self, token: Address, owner: Address, amount: U256) -> bool {
        let balance = self.balance_of(token, owner);
        match balance.checked_sub(amount) {
            Some(remaining) => {
                self.balances.insert((token, owner), remaining);
                true
            }
            None => false,
        }
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, token: Address, owner: Address) -> U256 {
        self.balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> bool {
        if self.balance_of(token, from) < amount {
            return false;
        }
        if from == to {
            return true;
        }
        // a credit that would overflow the recipient is refused, as a checked-math token reverts
        let credited = match self.balance_of(token, to).checked_add(amount) {
            Some(credited) => credited,
            None => return false,
        };
        if !self.debit(token, from, amount) {
            return false;
        }
        self.balances.insert((token, to), credited);
        true
    }

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> bool {
        let allowance = self.allowance(token, from, spender);
        if allowance < amount || self.balance_of(token, from) < amount {
            return false;
        }
        if !self.transfer(token, from, to, amount) {
            return false;
        }
        // an infinite approval is never consumed
        if allowance != U256::MAX {
            self.allowances
                .insert((token, from, spender), allowance - amount);
        }
        true
    }

    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) -> bool {
        self.allowances.insert((token, owner, spender), amount);
        true
    }
}
