use serde::Serialize;

use sweetshop_core::ItemId;

use crate::item::{ItemPatch, NewItem};

/// Ledger operation names, used as keys of the access policy table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Create,
    UpdateFields,
    Restock,
    Purchase,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::List,
        Operation::Create,
        Operation::UpdateFields,
        Operation::Restock,
        Operation::Purchase,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::UpdateFields => "update_fields",
            Operation::Restock => "restock",
            Operation::Purchase => "purchase",
            Operation::Delete => "delete",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed request against the inventory ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryCommand {
    List,
    Create(NewItem),
    UpdateFields { id: ItemId, patch: ItemPatch },
    Restock { id: ItemId, amount: i64 },
    Purchase { id: ItemId },
    Delete { id: ItemId },
}

impl InventoryCommand {
    pub fn operation(&self) -> Operation {
        match self {
            InventoryCommand::List => Operation::List,
            InventoryCommand::Create(_) => Operation::Create,
            InventoryCommand::UpdateFields { .. } => Operation::UpdateFields,
            InventoryCommand::Restock { .. } => Operation::Restock,
            InventoryCommand::Purchase { .. } => Operation::Purchase,
            InventoryCommand::Delete { .. } => Operation::Delete,
        }
    }
}
