use serde::Serialize;
use std::sync::Arc;

use super::apply;
use crate::account::Amount;
use crate::address::Address;
use crate::config::WbtcvConfig;
use crate::error::CustodyError;
use crate::ledger::BurnPolicy;
use crate::node::CustodyNode;
use crate::storage::Storage;

#[derive(Serialize)]
struct StatusReport {
    name: String,
    symbol: String,
    decimals: u8,
    owner: String,
    controller: Option<String>,
    paused: bool,
    burn_policy: BurnPolicy,
    total_supply: String,
    supply_cap: String,
    minted: String,
    burned: String,
    destroyed: String,
    escrowed: String,
    alert_block_wait: u64,
    block_number: u64,
    holders: usize,
}

pub fn handle_init(config: &WbtcvConfig) -> Result<(), CustodyError> {
    let storage = Arc::new(Storage::open(&config.node.db_path)?);
    if storage.load_ledger()?.is_some() {
        println!("Ledger already deployed at {}", config.node.db_path);
        return Ok(());
    }
    let node = CustodyNode::open(config, storage)?;
    let (owner, controller) =
        node.query(|s| (s.ledger.owner(), s.controller.as_ref().map(|c| c.address())))?;
    println!("Ledger deployed at {}", config.node.db_path);
    println!("Owner: {}", owner);
    match controller {
        Some(c) => println!("Controller: {} (2-of-3)", c),
        None => println!("Controller: none, owner acts directly"),
    }
    Ok(())
}

pub fn handle_status(node: &CustodyNode) -> Result<(), CustodyError> {
    let report = node.query(|s| {
        let ledger = &s.ledger;
        let counters = ledger.supply_counters();
        StatusReport {
            name: ledger.name().to_string(),
            symbol: ledger.symbol().to_string(),
            decimals: ledger.decimals(),
            owner: ledger.owner().to_string(),
            controller: s.controller.as_ref().map(|c| c.address().to_string()),
            paused: ledger.is_paused(),
            burn_policy: ledger.params().burn_policy,
            total_supply: counters.total_supply.to_string(),
            supply_cap: ledger.supply_cap().to_string(),
            minted: counters.minted.to_string(),
            burned: counters.burned.to_string(),
            destroyed: counters.destroyed.to_string(),
            escrowed: ledger.escrowed_total().to_string(),
            alert_block_wait: ledger.alert_block_wait(),
            block_number: ledger.block_number(),
            holders: ledger.holders().len(),
        }
    })?;
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| CustodyError::SerializationError(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}

pub fn handle_balance(node: &CustodyNode, address: &Address) -> Result<(), CustodyError> {
    let (snapshot, pending) = node.query(|s| {
        (
            s.ledger.account(address),
            s.ledger.pending_recovering_change(address),
        )
    })?;
    println!("Account: {}", snapshot.address);
    println!("  Balance:      {}", snapshot.balance);
    println!("  Escrowed out: {}", snapshot.escrowed_out);
    println!("  Incoming:     {}", snapshot.incoming);
    println!("  Blocked:      {}", snapshot.blocked);
    match snapshot.guardian {
        Some(g) => println!("  Guardian:     {}", g),
        None => println!("  Guardian:     none"),
    }
    if let Some(change) = pending {
        println!("  Pending change: {:?} since block {}", change.change, change.proposed_at);
    }
    Ok(())
}

pub fn handle_mint(node: &CustodyNode, caller: &Address, to: &Address, amount: Amount) -> Result<(), CustodyError> {
    apply(node, |s| Ok(s.ledger.mint(caller, to, amount)?))?;
    println!("Minted {} to {}", amount, to);
    Ok(())
}

pub fn handle_burn(node: &CustodyNode, caller: &Address, amount: Amount) -> Result<(), CustodyError> {
    apply(node, |s| Ok(s.ledger.burn(caller, amount)?))?;
    println!("Burned {} from {}", amount, caller);
    Ok(())
}

pub fn handle_transfer(node: &CustodyNode, caller: &Address, to: &Address, amount: Amount) -> Result<(), CustodyError> {
    apply(node, |s| Ok(s.ledger.transfer(caller, to, amount)?))?;
    println!("Transferred {} from {} to {}", amount, caller, to);
    Ok(())
}

pub fn handle_transfer_from(
    node: &CustodyNode,
    caller: &Address,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<(), CustodyError> {
    apply(node, |s| Ok(s.ledger.transfer_from(caller, from, to, amount)?))?;
    println!("Transferred {} from {} to {} on behalf of {}", amount, from, to, caller);
    Ok(())
}

pub fn handle_approve(node: &CustodyNode, caller: &Address, spender: &Address, amount: Amount) -> Result<(), CustodyError> {
    apply(node, |s| Ok(s.ledger.approve(caller, spender, amount)?))?;
    println!("Approved {} to spend {} for {}", spender, amount, caller);
    Ok(())
}

pub fn handle_advance(node: &CustodyNode, blocks: u64) -> Result<(), CustodyError> {
    let height = apply(node, |s| Ok(s.ledger.advance_blocks(blocks)))?;
    println!("Block number: {}", height);
    Ok(())
}
