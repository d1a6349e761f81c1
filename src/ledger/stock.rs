use crate::models::stock_item::StockItem;

use super::error::LedgerError;

/// The two derived counters kept on a stock item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevels {
    pub on_hand: i32,
    pub reserved_outbound: i32,
}

impl StockLevels {
    pub fn of(item: &StockItem) -> Self {
        Self {
            on_hand: item.on_hand_quantity,
            reserved_outbound: item.reserved_outbound_quantity,
        }
    }

    /// Applies signed deltas, refusing any result that would leave a
    /// counter negative.
    pub fn adjust(
        self,
        sku: &str,
        on_hand_delta: i32,
        reserved_delta: i32,
    ) -> Result<Self, LedgerError> {
        let on_hand = self.on_hand.checked_add(on_hand_delta).ok_or_else(|| {
            LedgerError::validation(format!("Quantity out of range for SKU {sku}"))
        })?;
        let reserved_outbound = self
            .reserved_outbound
            .checked_add(reserved_delta)
            .ok_or_else(|| {
                LedgerError::validation(format!("Quantity out of range for SKU {sku}"))
            })?;

        if on_hand < 0 {
            return Err(LedgerError::InsufficientStock {
                sku: sku.to_string(),
                requested: on_hand_delta.saturating_neg(),
                available: self.on_hand,
                index: None,
            });
        }
        if reserved_outbound < 0 {
            return Err(LedgerError::Storage(format!(
                "reserved outbound quantity for SKU {sku} would become negative ({reserved_outbound})"
            )));
        }

        Ok(Self {
            on_hand,
            reserved_outbound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(on_hand: i32, reserved_outbound: i32) -> StockLevels {
        StockLevels {
            on_hand,
            reserved_outbound,
        }
    }

    #[test]
    fn adjust_moves_stock_into_reservation() {
        let next = levels(100, 0).adjust("SKU-1", -30, 30).unwrap();
        assert_eq!(next, levels(70, 30));
    }

    #[test]
    fn adjust_rejects_negative_on_hand() {
        let err = levels(10, 0).adjust("SKU-1", -11, 11).unwrap_err();
        match err {
            LedgerError::InsufficientStock {
                sku,
                requested,
                available,
                ..
            } => {
                assert_eq!(sku, "SKU-1");
                assert_eq!(requested, 11);
                assert_eq!(available, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn adjust_rejects_negative_reservation() {
        let err = levels(10, 5).adjust("SKU-1", 6, -6).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[test]
    fn adjust_rejects_overflow() {
        let err = levels(i32::MAX, 0).adjust("SKU-1", 1, 0).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
