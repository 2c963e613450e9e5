//! # Domain Events
//!
//! Facts emitted by the shop that the progression engine reacts to.
//!
//! ```text
//! scan lookup ────────► ItemScanned
//! inventory upsert ───► ItemAdded
//! checkout finalize ──► SaleCompleted { sale_id, total }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Sale;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    ItemScanned { barcode: String },
    ItemAdded { barcode: String },
    SaleCompleted { sale_id: String, total: Money },
}

impl DomainEvent {
    pub fn sale_completed(sale: &Sale) -> Self {
        DomainEvent::SaleCompleted {
            sale_id: sale.id.clone(),
            total: sale.total,
        }
    }

    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ItemScanned { .. } => "item_scanned",
            DomainEvent::ItemAdded { .. } => "item_added",
            DomainEvent::SaleCompleted { .. } => "sale_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = DomainEvent::ItemScanned {
            barcode: "123".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"item_scanned","barcode":"123"}"#);
        assert_eq!(event.name(), "item_scanned");
    }
}
