use crate::domain::model::{LineItem, Money};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 送料無料になる小計の下限
pub const FREE_SHIPPING_THRESHOLD: Decimal = dec!(100.00);
/// 一律送料
pub const FLAT_SHIPPING_COST: Decimal = dec!(4.95);
/// 税率（21%）
pub const TAX_RATE: Decimal = dec!(0.21);

/// 注文の金額内訳
/// 常に明細と値引きから導出され、個別に編集されることはない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl OrderTotals {
    /// 明細と値引きから合計を計算する
    /// 1. 小計 = Σ 明細の小計
    /// 2. 送料 = 小計が100.00以上なら0、未満なら4.95
    /// 3. 税 = round(小計 × 0.21, 2)
    /// 4. 合計 = round(小計 + 送料 + 税 - 値引き, 2)
    ///
    /// 税は合計に加算する前に丸める
    pub fn calculate(line_items: &[LineItem], discount: Money) -> Self {
        let subtotal = line_items
            .iter()
            .fold(Money::zero(), |acc, line| acc.add(&line.subtotal()));

        let shipping_cost = if subtotal.amount() >= FREE_SHIPPING_THRESHOLD {
            Money::zero()
        } else {
            Money::eur(FLAT_SHIPPING_COST)
        };

        let tax = Money::eur(subtotal.amount() * TAX_RATE).rounded();

        let total = subtotal
            .add(&shipping_cost)
            .add(&tax)
            .subtract(&discount)
            .rounded();

        Self {
            subtotal,
            shipping_cost,
            tax,
            discount,
            total,
        }
    }

    /// 値引き前の合計（小計 + 送料 + 税）
    pub fn gross(&self) -> Money {
        self.subtotal.add(&self.shipping_cost).add(&self.tax)
    }

    pub fn has_free_shipping(&self) -> bool {
        self.shipping_cost.is_zero()
    }
}

impl Default for OrderTotals {
    fn default() -> Self {
        Self::calculate(&[], Money::zero())
    }
}
