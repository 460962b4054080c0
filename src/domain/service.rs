// ドメインサービス
// 複数の集約にまたがるビジネスロジックを実装

use crate::domain::error::DomainError;
use crate::domain::model::{Inventory, Order, PaymentMethod};

/// チェックアウト前に、カートの全明細が現在の販売可能数に収まっているか確認する
/// カートに入れた後で他の注文が在庫を確保している可能性がある
///
/// # Arguments
/// * `order` - 確認するカート
/// * `inventories` - 明細に対応する在庫
///
/// # Returns
/// * `Ok(())` - すべての明細が販売可能
/// * `Err(DomainError::InsufficientStock)` - 最初に不足した明細の販売可能数
pub fn verify_stock_for_checkout(
    order: &Order,
    inventories: &[Inventory],
) -> Result<(), DomainError> {
    for line in order.line_items() {
        let sellable = inventories
            .iter()
            .find(|inventory| inventory.card_id() == line.card_id())
            .map_or(0, Inventory::sellable_quantity);
        if line.quantity() > sellable {
            return Err(DomainError::InsufficientStock {
                available: sellable,
            });
        }
    }
    Ok(())
}

/// 支払いの取引番号を生成する（`<支払い方法>_<16桁の大文字16進数>`）
pub fn transaction_reference(method: PaymentMethod, token: uuid::Uuid) -> String {
    let hex = token.simple().to_string().to_uppercase();
    format!("{}_{}", method.as_str(), &hex[..16])
}
