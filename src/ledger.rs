//! The wBTCV token ledger
//!
//! Owns every piece of token state: balances and allowances, the guardian
//! registry, the alert queue, block flags and the block clock. Every
//! operation takes the authenticated caller explicitly and either commits
//! completely or returns an error with no state touched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::account::{AccountSnapshot, Amount, BalanceError, BalanceStore};
use crate::address::Address;
use crate::alert::{AlertEntry, AlertQueue, DEFAULT_ALERT_BLOCK_WAIT};
use crate::chain::{BlockClock, BlockHeight};
use crate::error::{LedgerError, LedgerResult};
use crate::events::{AlertEvent, EventLog, LedgerEvent};
use crate::recovery::{GuardianUpdate, PendingGuardianChange, RecoveryRegistry};

/// 10^8 base units per token.
pub const UNIT: Amount = 100_000_000;

/// 21 million tokens.
pub const DEFAULT_SUPPLY_CAP: Amount = 21_000_000 * UNIT;

/// Who may destroy supply through [`Ledger::burn`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BurnPolicy {
    /// The owner burns from its own balance directly.
    Owner,
    /// Direct burning is disabled; supply is only burned through the
    /// governance controller once a burn proposal is co-signed.
    ControllerOnly,
}

impl Default for BurnPolicy {
    fn default() -> Self {
        BurnPolicy::ControllerOnly
    }
}

/// Deployment-time token parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub supply_cap: Amount,
    pub alert_block_wait: u64,
    pub burn_policy: BurnPolicy,
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            name: "Wrapped BTCV".to_string(),
            symbol: "wBTCV".to_string(),
            decimals: 8,
            supply_cap: DEFAULT_SUPPLY_CAP,
            alert_block_wait: DEFAULT_ALERT_BLOCK_WAIT,
            burn_policy: BurnPolicy::default(),
        }
    }
}

/// Running supply totals.
///
/// `total_supply == minted - burned - destroyed` at all times, and
/// `total_supply == sum(balances) + escrowed`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SupplyCounters {
    pub total_supply: Amount,
    pub minted: Amount,
    pub burned: Amount,
    /// Value sent to the burn address.
    pub destroyed: Amount,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Ledger {
    params: TokenParams,
    owner: Address,
    paused: bool,
    balances: BalanceStore,
    blocked: HashSet<Address>,
    recovery: RecoveryRegistry,
    alerts: AlertQueue,
    clock: BlockClock,
    supply: SupplyCounters,
    /// Events since the last drain. Not part of the persisted snapshot.
    #[serde(skip)]
    events: EventLog,
}

fn balance_err(err: BalanceError) -> LedgerError {
    match err {
        BalanceError::InsufficientFunds => LedgerError::InsufficientBalance,
        BalanceError::InsufficientAllowance => LedgerError::InsufficientAllowance,
        BalanceError::Overflow => LedgerError::Overflow,
    }
}

impl Ledger {
    /// Deploy a ledger owned by `owner`, at block 0.
    pub fn new(params: TokenParams, owner: Address) -> Self {
        let wait = params.alert_block_wait;
        info!(%owner, symbol = %params.symbol, cap = params.supply_cap, wait, "ledger deployed");
        Self {
            params,
            owner,
            paused: false,
            balances: BalanceStore::new(),
            blocked: HashSet::new(),
            recovery: RecoveryRegistry::new(wait),
            alerts: AlertQueue::new(wait),
            clock: BlockClock::new(),
            supply: SupplyCounters::default(),
            events: EventLog::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn symbol(&self) -> &str {
        &self.params.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.params.decimals
    }

    pub fn params(&self) -> &TokenParams {
        &self.params
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn total_supply(&self) -> Amount {
        self.supply.total_supply
    }

    pub fn supply_cap(&self) -> Amount {
        self.params.supply_cap
    }

    pub fn supply_counters(&self) -> SupplyCounters {
        self.supply
    }

    /// Blocks an alert or guardian change must wait.
    pub fn alert_block_wait(&self) -> u64 {
        self.params.alert_block_wait
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_blocked(&self, user: &Address) -> bool {
        self.blocked.contains(user)
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.balance_of(account)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.balances.allowance(owner, spender)
    }

    pub fn holders(&self) -> Vec<(Address, Amount)> {
        self.balances.holders()
    }

    pub fn recovering_address(&self, account: &Address) -> Option<Address> {
        self.recovery.guardian_of(account)
    }

    pub fn pending_recovering_change(&self, account: &Address) -> Option<PendingGuardianChange> {
        self.recovery.pending_change(account)
    }

    /// Amount `sender` has in escrow awaiting redemption or cancellation.
    pub fn pending_alert_total(&self, sender: &Address) -> Amount {
        self.alerts.pending_from(sender)
    }

    /// Amount held in every alert queue.
    pub fn escrowed_total(&self) -> Amount {
        self.alerts.total_pending()
    }

    pub fn account(&self, address: &Address) -> AccountSnapshot {
        AccountSnapshot {
            address: *address,
            balance: self.balance_of(address),
            blocked: self.is_blocked(address),
            guardian: self.recovering_address(address),
            escrowed_out: self.alerts.pending_from(address),
            incoming: self.alerts.pending_to(address),
        }
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<(BlockHeight, LedgerEvent)> {
        self.events.drain()
    }

    // ---------------------------------------------------------------------
    // Block clock
    // ---------------------------------------------------------------------

    pub fn block_number(&self) -> BlockHeight {
        self.clock.height()
    }

    pub fn advance_blocks(&mut self, blocks: u64) -> BlockHeight {
        let height = self.clock.advance(blocks);
        debug!(height, "advanced block clock");
        height
    }

    pub fn set_block_number(&mut self, height: BlockHeight) -> LedgerResult<()> {
        self.clock
            .set_height(height)
            .map_err(|rewind| LedgerError::ClockRewind {
                current: rewind.current,
                requested: rewind.requested,
            })
    }

    fn emit(&mut self, event: LedgerEvent) {
        let block = self.clock.height();
        self.events.emit(block, event);
    }

    // ---------------------------------------------------------------------
    // Owner-gated operations
    // ---------------------------------------------------------------------

    fn ensure_owner(&self, caller: &Address) -> LedgerResult<()> {
        if *caller != self.owner {
            warn!(%caller, owner = %self.owner, "privileged call from non-owner");
            return Err(LedgerError::NotOwner);
        }
        Ok(())
    }

    fn ensure_not_paused(&self) -> LedgerResult<()> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    fn ensure_not_blocked(&self, user: &Address) -> LedgerResult<()> {
        if self.blocked.contains(user) {
            return Err(LedgerError::UserBlocked);
        }
        Ok(())
    }

    pub fn mint(&mut self, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.ensure_owner(caller)?;
        if to.is_zero() {
            return Err(LedgerError::MintToZero);
        }
        if to.is_burn() {
            return Err(LedgerError::MintToBurnAddress);
        }

        let new_supply = self
            .supply
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyExceeded)?;
        if new_supply > self.params.supply_cap {
            return Err(LedgerError::SupplyExceeded);
        }

        self.balances.credit(to, amount).map_err(balance_err)?;
        self.supply.total_supply = new_supply;
        self.supply.minted += amount;

        info!(%to, amount, total_supply = new_supply, "minted");
        self.emit(LedgerEvent::Mint { to: *to, amount });
        Ok(())
    }

    /// Burn from the caller's own balance.
    ///
    /// Fails with [`LedgerError::BurnDisabled`] under
    /// [`BurnPolicy::ControllerOnly`].
    pub fn burn(&mut self, caller: &Address, amount: Amount) -> LedgerResult<()> {
        match self.params.burn_policy {
            BurnPolicy::Owner => self.burn_owned(caller, amount),
            BurnPolicy::ControllerOnly => Err(LedgerError::BurnDisabled),
        }
    }

    /// Burn path used by the governance controller once a burn has quorum.
    pub(crate) fn governance_burn(&mut self, caller: &Address, amount: Amount) -> LedgerResult<()> {
        self.burn_owned(caller, amount)
    }

    fn burn_owned(&mut self, caller: &Address, amount: Amount) -> LedgerResult<()> {
        self.ensure_owner(caller)?;
        if self.balances.balance_of(caller) < amount {
            return Err(LedgerError::InsufficientFundsToBurn);
        }

        self.balances
            .debit(caller, amount)
            .map_err(|_| LedgerError::InsufficientFundsToBurn)?;
        self.supply.total_supply -= amount;
        self.supply.burned += amount;

        info!(from = %caller, amount, total_supply = self.supply.total_supply, "burned");
        self.emit(LedgerEvent::Burn { from: *caller, amount });
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: &Address) -> LedgerResult<()> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(LedgerError::OwnerZeroAddress);
        }

        let previous = std::mem::replace(&mut self.owner, *new_owner);
        info!(%previous, new_owner = %new_owner, "ownership transferred");
        self.emit(LedgerEvent::OwnershipTransferred {
            previous,
            new_owner: *new_owner,
        });
        Ok(())
    }

    pub fn block_user(&mut self, caller: &Address, user: &Address) -> LedgerResult<()> {
        self.ensure_owner(caller)?;
        if self.blocked.insert(*user) {
            info!(%user, "user blocked");
            self.emit(LedgerEvent::UserBlocked { user: *user });
        }
        Ok(())
    }

    pub fn unblock_user(&mut self, caller: &Address, user: &Address) -> LedgerResult<()> {
        self.ensure_owner(caller)?;
        if self.blocked.remove(user) {
            info!(%user, "user unblocked");
            self.emit(LedgerEvent::UserUnblocked { user: *user });
        }
        Ok(())
    }

    pub fn pause(&mut self, caller: &Address) -> LedgerResult<()> {
        self.ensure_owner(caller)?;
        self.ensure_not_paused()?;
        self.paused = true;
        info!(by = %caller, "token paused");
        self.emit(LedgerEvent::Paused { by: *caller });
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> LedgerResult<()> {
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.paused = false;
        info!(by = %caller, "token unpaused");
        self.emit(LedgerEvent::Unpaused { by: *caller });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Transfers
    // ---------------------------------------------------------------------

    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.ensure_not_paused()?;
        self.ensure_not_blocked(caller)?;
        self.move_funds(caller, to, amount)
    }

    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.ensure_not_paused()?;
        self.ensure_not_blocked(caller)?;
        self.ensure_not_blocked(from)?;
        if self.recovery.guardian_of(from).is_some() {
            return Err(LedgerError::SecureAccountRestricted);
        }
        if self.balances.allowance(from, caller) < amount {
            return Err(LedgerError::InsufficientAllowance);
        }

        // `from` has no guardian, so this settles immediately.
        self.move_funds(from, to, amount)?;
        self.balances
            .spend_allowance(from, caller, amount)
            .map_err(balance_err)
    }

    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: Amount) -> LedgerResult<()> {
        self.ensure_not_blocked(caller)?;
        if self.recovery.guardian_of(caller).is_some() {
            return Err(LedgerError::SecureAccountRestricted);
        }
        if spender.is_zero() {
            return Err(LedgerError::ApproveToZero);
        }

        self.balances.set_allowance(caller, spender, amount);
        debug!(owner = %caller, %spender, amount, "approval set");
        self.emit(LedgerEvent::Approval {
            owner: *caller,
            spender: *spender,
            amount,
        });
        Ok(())
    }

    /// Settle a transfer immediately, or escrow it if `from` has a guardian.
    fn move_funds(&mut self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        if let Some(guardian) = self.recovery.guardian_of(from) {
            if to.is_zero() {
                return Err(LedgerError::AlertZeroAddress);
            }
            self.balances.debit(from, amount).map_err(balance_err)?;
            let entry = self
                .alerts
                .push(*from, *to, amount, guardian, self.clock.height());

            info!(
                id = entry.id,
                sender = %from,
                recipient = %to,
                amount,
                cancel_account = %guardian,
                "transfer escrowed"
            );
            self.emit(LedgerEvent::SentAlert(AlertEvent::from(&entry)));
            return Ok(());
        }

        if to.is_zero() {
            return Err(LedgerError::TransferToZero);
        }
        if to.is_burn() {
            self.balances.debit(from, amount).map_err(balance_err)?;
            self.destroy(amount);
        } else {
            self.balances.transfer(from, to, amount).map_err(balance_err)?;
        }

        debug!(%from, %to, amount, "transfer settled");
        self.emit(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }

    /// Value that reached the burn address leaves the supply.
    fn destroy(&mut self, amount: Amount) {
        self.supply.total_supply -= amount;
        self.supply.destroyed += amount;
        info!(amount, total_supply = self.supply.total_supply, "value sent to burn address destroyed");
    }

    // ---------------------------------------------------------------------
    // Guardian registry
    // ---------------------------------------------------------------------

    pub fn set_new_recovering_address(&mut self, caller: &Address, guardian: &Address) -> LedgerResult<GuardianUpdate> {
        let now = self.clock.height();
        let update = self.recovery.set_new(*caller, *guardian, now)?;
        let event = match update {
            GuardianUpdate::Applied => LedgerEvent::RecoveringAddressSet {
                account: *caller,
                guardian: *guardian,
            },
            GuardianUpdate::Proposed { ready_at } => LedgerEvent::RecoveringAddressChangeProposed {
                account: *caller,
                guardian: *guardian,
                ready_at,
            },
        };
        self.emit(event);
        Ok(update)
    }

    pub fn confirm_new_recovering_address(&mut self, caller: &Address, expected: &Address) -> LedgerResult<()> {
        let now = self.clock.height();
        self.recovery.confirm_new(*caller, *expected, now)?;
        self.emit(LedgerEvent::RecoveringAddressSet {
            account: *caller,
            guardian: *expected,
        });
        Ok(())
    }

    /// Start removing the caller's guardian. Returns the block from which
    /// the deletion can be confirmed.
    pub fn delete_recovering_address(&mut self, caller: &Address) -> LedgerResult<BlockHeight> {
        let now = self.clock.height();
        let ready_at = self.recovery.delete(*caller, now)?;
        self.emit(LedgerEvent::RecoveringAddressDeleteProposed {
            account: *caller,
            ready_at,
        });
        Ok(ready_at)
    }

    pub fn confirm_delete_recovering_address(&mut self, caller: &Address) -> LedgerResult<()> {
        let now = self.clock.height();
        let guardian = self.recovery.confirm_delete(*caller, now)?;
        self.emit(LedgerEvent::RecoveringAddressDeleted {
            account: *caller,
            guardian,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Alerts
    // ---------------------------------------------------------------------

    pub fn get_incoming_alerts(&self, recipient: &Address) -> LedgerResult<Vec<AlertEntry>> {
        if recipient.is_zero() {
            return Err(LedgerError::AlertZeroAddress);
        }
        Ok(self.alerts.incoming(recipient).cloned().collect())
    }

    pub fn get_ready_alerts(&self, recipient: &Address) -> LedgerResult<Vec<AlertEntry>> {
        if recipient.is_zero() {
            return Err(LedgerError::AlertZeroAddress);
        }
        Ok(self
            .alerts
            .ready(recipient, self.clock.height())
            .cloned()
            .collect())
    }

    /// Credit `recipient` with every alert whose lock has elapsed. Anyone
    /// may trigger this; the funds only ever go to `recipient`. Returns the
    /// amount released.
    pub fn redeem_ready_alerts(&mut self, caller: &Address, recipient: &Address) -> LedgerResult<Amount> {
        if recipient.is_zero() {
            return Err(LedgerError::AlertZeroAddress);
        }
        self.ensure_not_paused()?;
        self.ensure_not_blocked(recipient)?;

        let now = self.clock.height();
        let total: Amount = self.alerts.ready(recipient, now).map(|e| e.amount).sum();
        if !recipient.is_burn() {
            self.balances
                .balance_of(recipient)
                .checked_add(total)
                .ok_or(LedgerError::Overflow)?;
        }

        let redeemed = self.alerts.take_ready(recipient, now);
        if recipient.is_burn() {
            self.destroy(total);
        } else {
            self.balances.credit(recipient, total).map_err(balance_err)?;
        }

        for entry in &redeemed {
            self.emit(LedgerEvent::RedeemedAlert(AlertEvent::from(entry)));
        }
        info!(%caller, %recipient, count = redeemed.len(), amount = total, "alerts redeemed");
        Ok(total)
    }

    /// Cancel the alerts to `recipient` that the caller guards, refunding
    /// each sender. Entries guarded by others are untouched; a caller that
    /// guards none of them cancels nothing. Returns the amount refunded.
    pub fn cancel_transfers(&mut self, caller: &Address, recipient: &Address) -> LedgerResult<Amount> {
        if recipient.is_zero() {
            return Err(LedgerError::AlertZeroAddress);
        }

        let cancelled = self.alerts.take_cancellable(recipient, caller);
        if cancelled.is_empty() {
            debug!(%caller, %recipient, "no alerts cancellable by caller");
            return Ok(0);
        }

        let mut refunded: Amount = 0;
        for entry in &cancelled {
            // Escrowed funds were debited from this sender, so the credit
            // stays within the supply.
            self.balances
                .credit(&entry.sender, entry.amount)
                .map_err(balance_err)?;
            refunded += entry.amount;
            self.emit(LedgerEvent::CancelledAlert(AlertEvent::from(entry)));
        }

        info!(%caller, %recipient, count = cancelled.len(), amount = refunded, "alerts cancelled");
        Ok(refunded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{BURN_ADDRESS, ZERO_ADDRESS};

    const WAIT: u64 = 10;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn owner() -> Address {
        addr("owner")
    }

    fn ledger() -> Ledger {
        let params = TokenParams {
            alert_block_wait: WAIT,
            burn_policy: BurnPolicy::Owner,
            ..TokenParams::default()
        };
        Ledger::new(params, owner())
    }

    fn funded(account: &str, amount: Amount) -> Ledger {
        let mut l = ledger();
        l.mint(&owner(), &addr(account), amount).unwrap();
        l
    }

    #[test]
    fn test_initial_state() {
        let l = ledger();
        assert_eq!(l.balance_of(&owner()), 0);
        assert_eq!(l.total_supply(), 0);
        assert_eq!(l.symbol(), "wBTCV");
        assert_eq!(l.decimals(), 8);
        assert_eq!(l.alert_block_wait(), WAIT);
    }

    #[test]
    fn test_mint_and_burn_by_owner() {
        let mut l = ledger();
        l.mint(&owner(), &owner(), 20).unwrap();
        assert_eq!(l.balance_of(&owner()), 20);

        l.burn(&owner(), 10).unwrap();
        assert_eq!(l.balance_of(&owner()), 10);
        assert_eq!(l.total_supply(), 10);

        assert_eq!(l.burn(&owner(), 11), Err(LedgerError::InsufficientFundsToBurn));
    }

    #[test]
    fn test_privileged_calls_need_owner() {
        let mut l = ledger();
        let x = addr("x");
        assert_eq!(l.mint(&x, &x, 1), Err(LedgerError::NotOwner));
        assert_eq!(l.burn(&x, 0), Err(LedgerError::NotOwner));
        assert_eq!(l.block_user(&x, &x), Err(LedgerError::NotOwner));
        assert_eq!(l.pause(&x), Err(LedgerError::NotOwner));
        assert_eq!(l.transfer_ownership(&x, &x), Err(LedgerError::NotOwner));
    }

    #[test]
    fn test_burn_disabled_under_controller_policy() {
        let mut l = Ledger::new(TokenParams::default(), owner());
        l.mint(&owner(), &owner(), 20).unwrap();
        assert_eq!(l.burn(&owner(), 10), Err(LedgerError::BurnDisabled));
        l.governance_burn(&owner(), 10).unwrap();
        assert_eq!(l.total_supply(), 10);
    }

    #[test]
    fn test_supply_cap() {
        let mut l = ledger();
        let x = addr("x");
        l.mint(&owner(), &x, 20_000_000 * UNIT).unwrap();
        assert_eq!(
            l.mint(&owner(), &x, 20_000_000 * UNIT),
            Err(LedgerError::SupplyExceeded)
        );
        assert_eq!(l.balance_of(&x), 20_000_000 * UNIT);
        l.mint(&owner(), &x, 1_000_000 * UNIT).unwrap();
        assert_eq!(l.mint(&owner(), &x, 1), Err(LedgerError::SupplyExceeded));
    }

    #[test]
    fn test_mint_to_zero_or_burn_rejected() {
        let mut l = ledger();
        assert_eq!(l.mint(&owner(), &ZERO_ADDRESS, 1), Err(LedgerError::MintToZero));
        assert_eq!(
            l.mint(&owner(), &BURN_ADDRESS, 7),
            Err(LedgerError::MintToBurnAddress)
        );
        assert_eq!(l.balance_of(&BURN_ADDRESS), 0);
        assert_eq!(l.total_supply(), 0);
    }

    #[test]
    fn test_plain_transfer() {
        let mut l = funded("x", 100);
        l.transfer(&addr("x"), &addr("y"), 40).unwrap();
        assert_eq!(l.balance_of(&addr("x")), 60);
        assert_eq!(l.balance_of(&addr("y")), 40);

        assert_eq!(
            l.transfer(&addr("x"), &addr("y"), 61),
            Err(LedgerError::InsufficientBalance)
        );
        assert_eq!(
            l.transfer(&addr("x"), &ZERO_ADDRESS, 1),
            Err(LedgerError::TransferToZero)
        );
    }

    #[test]
    fn test_transfer_to_burn_address_destroys() {
        let mut l = funded("x", 100);
        l.transfer(&addr("x"), &BURN_ADDRESS, 30).unwrap();
        assert_eq!(l.balance_of(&BURN_ADDRESS), 0);
        assert_eq!(l.total_supply(), 70);
        assert_eq!(l.supply_counters().destroyed, 30);
    }

    #[test]
    fn test_blocked_users() {
        let mut l = funded("x", 100);
        l.block_user(&owner(), &addr("x")).unwrap();
        assert!(l.is_blocked(&addr("x")));
        assert_eq!(l.transfer(&addr("x"), &addr("y"), 1), Err(LedgerError::UserBlocked));
        assert_eq!(l.approve(&addr("x"), &addr("y"), 1), Err(LedgerError::UserBlocked));

        l.unblock_user(&owner(), &addr("x")).unwrap();
        l.transfer(&addr("x"), &addr("y"), 1).unwrap();
    }

    #[test]
    fn test_transfer_from_checks_both_parties() {
        let mut l = funded("x", 100);
        l.approve(&addr("x"), &addr("spender"), 50).unwrap();

        l.block_user(&owner(), &addr("x")).unwrap();
        assert_eq!(
            l.transfer_from(&addr("spender"), &addr("x"), &addr("y"), 10),
            Err(LedgerError::UserBlocked)
        );
        l.unblock_user(&owner(), &addr("x")).unwrap();

        l.block_user(&owner(), &addr("spender")).unwrap();
        assert_eq!(
            l.transfer_from(&addr("spender"), &addr("x"), &addr("y"), 10),
            Err(LedgerError::UserBlocked)
        );
        l.unblock_user(&owner(), &addr("spender")).unwrap();

        l.transfer_from(&addr("spender"), &addr("x"), &addr("y"), 10).unwrap();
        assert_eq!(l.allowance(&addr("x"), &addr("spender")), 40);
        assert_eq!(l.balance_of(&addr("y")), 10);

        assert_eq!(
            l.transfer_from(&addr("spender"), &addr("x"), &addr("y"), 41),
            Err(LedgerError::InsufficientAllowance)
        );
    }

    #[test]
    fn test_failed_transfer_from_keeps_allowance() {
        let mut l = funded("x", 5);
        l.approve(&addr("x"), &addr("spender"), 50).unwrap();
        assert_eq!(
            l.transfer_from(&addr("spender"), &addr("x"), &addr("y"), 10),
            Err(LedgerError::InsufficientBalance)
        );
        assert_eq!(l.allowance(&addr("x"), &addr("spender")), 50);
    }

    #[test]
    fn test_secure_accounts_cannot_use_allowances() {
        let mut l = funded("x", 100);
        l.approve(&addr("x"), &addr("spender"), 50).unwrap();
        l.set_new_recovering_address(&addr("x"), &addr("g")).unwrap();

        assert_eq!(
            l.approve(&addr("x"), &addr("spender"), 10),
            Err(LedgerError::SecureAccountRestricted)
        );
        assert_eq!(
            l.transfer_from(&addr("spender"), &addr("x"), &addr("y"), 10),
            Err(LedgerError::SecureAccountRestricted)
        );
    }

    #[test]
    fn test_pause_gates_transfers() {
        let mut l = funded("x", 100);
        l.pause(&owner()).unwrap();
        assert_eq!(l.pause(&owner()), Err(LedgerError::Paused));
        assert_eq!(l.transfer(&addr("x"), &addr("y"), 1), Err(LedgerError::Paused));

        l.unpause(&owner()).unwrap();
        assert_eq!(l.unpause(&owner()), Err(LedgerError::NotPaused));
        l.transfer(&addr("x"), &addr("y"), 1).unwrap();
    }

    #[test]
    fn test_guarded_transfer_is_escrowed() {
        let mut l = funded("x", 100);
        l.set_new_recovering_address(&addr("x"), &addr("g")).unwrap();
        l.transfer(&addr("x"), &addr("y"), 1).unwrap();

        assert_eq!(l.balance_of(&addr("x")), 99);
        assert_eq!(l.balance_of(&addr("y")), 0);
        assert_eq!(l.pending_alert_total(&addr("x")), 1);
        assert_eq!(l.total_supply(), 100);

        let incoming = l.get_incoming_alerts(&addr("y")).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].cancel_account, addr("g"));
        assert!(l.get_ready_alerts(&addr("y")).unwrap().is_empty());

        assert_eq!(l.redeem_ready_alerts(&addr("y"), &addr("y")), Ok(0));
        l.advance_blocks(WAIT);
        assert_eq!(l.get_ready_alerts(&addr("y")).unwrap().len(), 1);
        assert_eq!(l.redeem_ready_alerts(&addr("y"), &addr("y")), Ok(1));
        assert_eq!(l.balance_of(&addr("y")), 1);
        assert!(l.get_incoming_alerts(&addr("y")).unwrap().is_empty());
    }

    #[test]
    fn test_guarded_transfer_to_zero_rejected() {
        let mut l = funded("x", 100);
        l.set_new_recovering_address(&addr("x"), &addr("g")).unwrap();
        assert_eq!(
            l.transfer(&addr("x"), &ZERO_ADDRESS, 1),
            Err(LedgerError::AlertZeroAddress)
        );
        assert_eq!(
            l.transfer(&addr("x"), &addr("y"), 101),
            Err(LedgerError::InsufficientBalance)
        );
        assert_eq!(l.balance_of(&addr("x")), 100);
    }

    #[test]
    fn test_alert_queries_reject_zero() {
        let mut l = ledger();
        assert_eq!(l.get_incoming_alerts(&ZERO_ADDRESS), Err(LedgerError::AlertZeroAddress));
        assert_eq!(l.get_ready_alerts(&ZERO_ADDRESS), Err(LedgerError::AlertZeroAddress));
        assert_eq!(
            l.redeem_ready_alerts(&owner(), &ZERO_ADDRESS),
            Err(LedgerError::AlertZeroAddress)
        );
        assert_eq!(
            l.cancel_transfers(&owner(), &ZERO_ADDRESS),
            Err(LedgerError::AlertZeroAddress)
        );
    }

    #[test]
    fn test_guardian_cancels() {
        let mut l = funded("x", 100);
        l.set_new_recovering_address(&addr("x"), &addr("g")).unwrap();
        l.transfer(&addr("x"), &addr("y"), 30).unwrap();

        // a stranger cancels nothing
        assert_eq!(l.cancel_transfers(&addr("mallory"), &addr("y")), Ok(0));
        assert_eq!(l.get_incoming_alerts(&addr("y")).unwrap().len(), 1);

        assert_eq!(l.cancel_transfers(&addr("g"), &addr("y")), Ok(30));
        assert_eq!(l.balance_of(&addr("x")), 100);
        assert!(l.get_incoming_alerts(&addr("y")).unwrap().is_empty());
        assert_eq!(l.escrowed_total(), 0);
    }

    #[test]
    fn test_redeem_to_burn_address_destroys() {
        let mut l = funded("x", 100);
        l.set_new_recovering_address(&addr("x"), &addr("g")).unwrap();
        l.transfer(&addr("x"), &BURN_ADDRESS, 25).unwrap();
        assert_eq!(l.total_supply(), 100);

        l.advance_blocks(WAIT);
        assert_eq!(l.redeem_ready_alerts(&addr("x"), &BURN_ADDRESS), Ok(25));
        assert_eq!(l.balance_of(&BURN_ADDRESS), 0);
        assert_eq!(l.total_supply(), 75);
    }

    #[test]
    fn test_redeem_blocked_or_paused() {
        let mut l = funded("x", 100);
        l.set_new_recovering_address(&addr("x"), &addr("g")).unwrap();
        l.transfer(&addr("x"), &addr("y"), 5).unwrap();
        l.advance_blocks(WAIT);

        l.block_user(&owner(), &addr("y")).unwrap();
        assert_eq!(
            l.redeem_ready_alerts(&addr("y"), &addr("y")),
            Err(LedgerError::UserBlocked)
        );
        l.unblock_user(&owner(), &addr("y")).unwrap();

        l.pause(&owner()).unwrap();
        assert_eq!(l.redeem_ready_alerts(&addr("y"), &addr("y")), Err(LedgerError::Paused));
        // the guardian can still claw back while paused
        assert_eq!(l.cancel_transfers(&addr("g"), &addr("y")), Ok(5));
    }

    #[test]
    fn test_alerts_emit_events() {
        let mut l = funded("x", 100);
        l.drain_events();
        l.set_new_recovering_address(&addr("x"), &addr("g")).unwrap();
        l.transfer(&addr("x"), &addr("y"), 1).unwrap();
        l.transfer(&addr("x"), &addr("y"), 2).unwrap();
        l.cancel_transfers(&addr("g"), &addr("y")).unwrap();

        let events: Vec<_> = l.drain_events().into_iter().map(|(_, e)| e).collect();
        let sent = events
            .iter()
            .filter(|e| matches!(e, LedgerEvent::SentAlert(_)))
            .count();
        let cancelled = events
            .iter()
            .filter(|e| matches!(e, LedgerEvent::CancelledAlert(_)))
            .count();
        assert_eq!(sent, 2);
        assert_eq!(cancelled, 2);
        assert!(l.events().is_empty());
    }

    #[test]
    fn test_ownership_transfer() {
        let mut l = ledger();
        assert_eq!(
            l.transfer_ownership(&owner(), &ZERO_ADDRESS),
            Err(LedgerError::OwnerZeroAddress)
        );
        l.transfer_ownership(&owner(), &addr("next")).unwrap();
        assert_eq!(l.owner(), addr("next"));
        assert_eq!(l.mint(&owner(), &owner(), 1), Err(LedgerError::NotOwner));
    }

    #[test]
    fn test_clock_cannot_rewind() {
        let mut l = ledger();
        l.set_block_number(100).unwrap();
        assert_eq!(
            l.set_block_number(99),
            Err(LedgerError::ClockRewind { current: 100, requested: 99 })
        );
    }
}
