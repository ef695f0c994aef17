//! Mutation dispatch: the single place where inventory operations meet the
//! role policy.
//!
//! ## Command Execution Flow
//!
//! ```text
//! Identity + InventoryCommand
//!   ↓
//! 1. Look up the command's operation in the policy table
//!   ↓
//! 2. Reject with Forbidden if the identity lacks the required role
//!   ↓
//! 3. Hand the command to the InventoryLedger
//! ```
//!
//! Authentication happens earlier (the Access Guard produces the `Identity`).
//! A rejected command never reaches the ledger, so it has no side effects.
//! HTTP handlers call [`MutationDispatcher::authorize`] before parsing request
//! input, so a caller without the role sees `Forbidden` even for a malformed
//! request.

use tracing::{info, instrument};

use sweetshop_auth::{Identity, Role, require_role};
use sweetshop_core::{DomainResult, ItemId};
use sweetshop_inventory::{InventoryCommand, InventoryItem, InventoryLedger, Operation};

/// What a caller must hold to run an operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    /// Any valid session.
    Authenticated,
    /// A session carrying this role.
    Role(Role),
}

/// The policy table.
pub fn required_access(operation: Operation) -> Access {
    match operation {
        Operation::List | Operation::Purchase => Access::Authenticated,
        Operation::Create | Operation::UpdateFields | Operation::Restock | Operation::Delete => {
            Access::Role(Role::Admin)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Items(Vec<InventoryItem>),
    Created(InventoryItem),
    Updated(InventoryItem),
    Deleted(ItemId),
}

#[derive(Debug, Clone)]
pub struct MutationDispatcher {
    ledger: InventoryLedger,
}

impl MutationDispatcher {
    pub fn new(ledger: InventoryLedger) -> Self {
        Self { ledger }
    }

    /// Check `identity` against the policy table for `operation`.
    pub fn authorize(&self, identity: &Identity, operation: Operation) -> DomainResult<()> {
        match required_access(operation) {
            Access::Authenticated => Ok(()),
            Access::Role(role) => require_role(identity, role).inspect_err(|_| {
                info!(subject_id = %identity.subject_id, role = %identity.role, %operation, "operation denied")
            }),
        }
    }

    #[instrument(
        skip(self, identity, command),
        fields(subject_id = %identity.subject_id, operation = %command.operation())
    )]
    pub async fn dispatch(&self, identity: &Identity, command: InventoryCommand) -> DomainResult<DispatchOutcome> {
        self.authorize(identity, command.operation())?;

        match command {
            InventoryCommand::List => self.ledger.list().await.map(DispatchOutcome::Items),
            InventoryCommand::Create(input) => self.ledger.create(input).await.map(DispatchOutcome::Created),
            InventoryCommand::UpdateFields { id, patch } => {
                self.ledger.update_fields(id, patch).await.map(DispatchOutcome::Updated)
            }
            InventoryCommand::Restock { id, amount } => {
                self.ledger.restock(id, amount).await.map(DispatchOutcome::Updated)
            }
            InventoryCommand::Purchase { id } => self.ledger.purchase(id).await.map(DispatchOutcome::Updated),
            InventoryCommand::Delete { id } => {
                self.ledger.delete(id).await?;
                Ok(DispatchOutcome::Deleted(id))
            }
        }
    }
}
