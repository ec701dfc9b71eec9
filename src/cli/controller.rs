use clap::Subcommand;

use super::{apply, parse_address};
use crate::account::Amount;
use crate::address::Address;
use crate::error::CustodyError;
use crate::node::CustodyNode;

#[derive(Subcommand)]
pub enum ControllerCommands {
    ProposeMint {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        to: Address,
        #[arg(long)]
        amount: Amount,
    },
    SignMint {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        to: Address,
        #[arg(long)]
        amount: Amount,
    },
    /// Propose burning from the controller's own balance
    ProposeBurn {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long)]
        amount: Amount,
    },
    SignBurn {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long)]
        amount: Amount,
    },
    ProposeOwner {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        new_owner: Address,
    },
    SignOwner {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        new_owner: Address,
    },
    Block {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        user: Address,
    },
    Unblock {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        user: Address,
    },
    Pause {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
    },
    Unpause {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
    },
    /// List proposals waiting for a second signature
    Pending,
}

pub fn handle_controller_command(node: &CustodyNode, cmd: ControllerCommands) -> Result<(), CustodyError> {
    match cmd {
        ControllerCommands::ProposeMint { caller, to, amount } => {
            let id = apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.mint(ledger, &caller, &to, amount)?)
            })?;
            println!("Mint proposal #{} created: {} to {}", id, amount, to);
        }
        ControllerCommands::SignMint { caller, to, amount } => {
            apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.sign_mint(ledger, &caller, &to, amount)?)
            })?;
            println!("Minted {} to {}", amount, to);
        }
        ControllerCommands::ProposeBurn { caller, amount } => {
            let id = apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.burn(ledger, &caller, amount)?)
            })?;
            println!("Burn proposal #{} created: {}", id, amount);
        }
        ControllerCommands::SignBurn { caller, amount } => {
            apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.sign_burn(ledger, &caller, amount)?)
            })?;
            println!("Burned {}", amount);
        }
        ControllerCommands::ProposeOwner { caller, new_owner } => {
            let id = apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.transfer_ownership(ledger, &caller, &new_owner)?)
            })?;
            println!("Ownership proposal #{} created: {}", id, new_owner);
        }
        ControllerCommands::SignOwner { caller, new_owner } => {
            apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.sign_ownership_transfer(ledger, &caller, &new_owner)?)
            })?;
            println!("Ownership transferred to {}", new_owner);
        }
        ControllerCommands::Block { caller, user } => {
            apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.block_user(ledger, &caller, &user)?)
            })?;
            println!("Blocked {}", user);
        }
        ControllerCommands::Unblock { caller, user } => {
            apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.unblock_user(ledger, &caller, &user)?)
            })?;
            println!("Unblocked {}", user);
        }
        ControllerCommands::Pause { caller } => {
            apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.pause_token(ledger, &caller)?)
            })?;
            println!("Token paused");
        }
        ControllerCommands::Unpause { caller } => {
            apply(node, |s| {
                let (ctl, ledger) = s.governed()?;
                Ok(ctl.unpause_token(ledger, &caller)?)
            })?;
            println!("Token unpaused");
        }
        ControllerCommands::Pending => {
            let lines = node.query(|s| {
                let mut lines = Vec::new();
                if let Some(ctl) = &s.controller {
                    for p in ctl.pending_mints() {
                        lines.push(format!(
                            " - mint #{} {} to {} by {} at block {}",
                            p.id, p.args.amount, p.args.to, p.proposer, p.proposed_at
                        ));
                    }
                    for p in ctl.pending_burns() {
                        lines.push(format!(
                            " - burn #{} {} by {} at block {}",
                            p.id, p.args, p.proposer, p.proposed_at
                        ));
                    }
                    for p in ctl.pending_ownership_transfers() {
                        lines.push(format!(
                            " - owner #{} to {} by {} at block {}",
                            p.id, p.args, p.proposer, p.proposed_at
                        ));
                    }
                }
                lines
            })?;
            println!("Pending proposals ({}):", lines.len());
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
