use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tcg_storefront::domain::model::{
    round_half_up, CardId, CustomerId, Inventory, LineItem, Money, Order, OrderId, OrderStatus,
    OrderTotals, PaymentMethod, ShippingDetails, ShippingDetailsInput, StockMovement, FLAT_SHIPPING_COST,
    FREE_SHIPPING_THRESHOLD, TAX_RATE,
};

/// セント単位の金額を生成する
fn cents(max: i64) -> impl Strategy<Value = Decimal> {
    (0i64..max).prop_map(|c| Decimal::new(c, 2))
}

fn empty_cart() -> Order {
    Order::new_cart(OrderId::new(), CustomerId::new(), Utc::now())
}

// Money のプロパティベーステスト
proptest! {
    /// Money の加算は交換法則を満たす
    #[test]
    fn test_money_addition_is_commutative(a in cents(10_000_000), b in cents(10_000_000)) {
        let left = Money::eur(a).add(&Money::eur(b));
        let right = Money::eur(b).add(&Money::eur(a));
        prop_assert_eq!(left, right);
    }

    /// Money の乗算は分配法則を満たす (a * (m + n) = a * m + a * n)
    #[test]
    fn test_money_multiplication_distributive(
        amount in cents(1_000_000),
        m in 1u32..100,
        n in 1u32..100,
    ) {
        let money = Money::eur(amount);
        let left = money.multiply(m + n);
        let right = money.multiply(m).add(&money.multiply(n));
        prop_assert_eq!(left, right);
    }

    /// 丸めた結果は小数点以下2桁以内
    #[test]
    fn test_round_half_up_has_two_decimals(mantissa in 0i64..100_000_000, scale in 0u32..6) {
        let rounded = round_half_up(Decimal::new(mantissa, scale));
        prop_assert!(rounded.scale() <= 2);
        prop_assert!((rounded - Decimal::new(mantissa, scale)).abs() <= Decimal::new(5, 3));
    }
}

// LineItem のプロパティベーステスト
proptest! {
    /// 明細の小計は常に単価 × 数量と等しい
    #[test]
    fn test_line_item_subtotal(price in cents(100_000), quantity in 1u32..50) {
        let line = LineItem::new(CardId::new(), quantity, Money::eur(price)).unwrap();
        prop_assert_eq!(line.subtotal().amount(), price * Decimal::from(quantity));
    }

    /// 数量0の明細は作成できない
    #[test]
    fn test_line_item_zero_quantity_rejected(price in cents(100_000)) {
        prop_assert!(LineItem::new(CardId::new(), 0, Money::eur(price)).is_err());
    }
}

// OrderTotals のプロパティベーステスト
proptest! {
    /// 合計 = round(小計 + 送料 + round(小計 × 税率) - 値引き)
    #[test]
    fn test_totals_formula(
        lines in prop::collection::vec((cents(50_000), 1u32..10), 0..6),
    ) {
        let items: Vec<LineItem> = lines
            .iter()
            .map(|(price, qty)| LineItem::new(CardId::new(), *qty, Money::eur(*price)).unwrap())
            .collect();
        let totals = OrderTotals::calculate(&items, Money::zero());

        let subtotal: Decimal = lines
            .iter()
            .map(|(price, qty)| *price * Decimal::from(*qty))
            .sum();
        let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING_COST
        };
        let tax = round_half_up(subtotal * TAX_RATE);

        prop_assert_eq!(totals.subtotal.amount(), subtotal);
        prop_assert_eq!(totals.shipping_cost.amount(), shipping);
        prop_assert_eq!(totals.tax.amount(), tax);
        prop_assert_eq!(totals.total.amount(), round_half_up(subtotal + shipping + tax));
        prop_assert_eq!(totals.has_free_shipping(), subtotal >= FREE_SHIPPING_THRESHOLD);
    }

    /// 値引きは合計からそのまま差し引かれる
    #[test]
    fn test_discount_reduces_total(price in cents(50_000), quantity in 1u32..5, ratio in 0u32..=100) {
        let items = vec![LineItem::new(CardId::new(), quantity, Money::eur(price)).unwrap()];
        let gross = OrderTotals::calculate(&items, Money::zero()).gross();
        let discount = Money::eur(round_half_up(gross.amount() * Decimal::from(ratio) / Decimal::from(100)));

        let totals = OrderTotals::calculate(&items, discount);

        prop_assert_eq!(totals.total.amount(), round_half_up(gross.amount() - discount.amount()));
        prop_assert!(!totals.total.amount().is_sign_negative() || totals.total.is_zero());
    }
}

// Order のプロパティベーステスト
proptest! {
    /// 同じカードを複数回追加すると1つの明細に数量が累積される
    #[test]
    fn test_same_card_merges_into_one_line(
        additions in prop::collection::vec(1u32..5, 1..6),
    ) {
        let total: u32 = additions.iter().sum();
        let inventory = Inventory::new(CardId::new(), total, Money::eur(Decimal::new(250, 2)));
        let mut cart = empty_cart();

        for quantity in &additions {
            cart.add_or_increment(&inventory, *quantity).unwrap();
        }

        prop_assert_eq!(cart.line_items().len(), 1);
        prop_assert_eq!(cart.item_count(), u64::from(total));
    }

    /// 販売可能数を超える追加は拒否され、カートは変化しない
    #[test]
    fn test_add_beyond_sellable_rejected(stock in 0u32..20, extra in 1u32..10) {
        let inventory = Inventory::new(CardId::new(), stock, Money::eur(Decimal::ONE));
        let mut cart = empty_cart();

        let result = cart.add_or_increment(&inventory, stock + extra);

        prop_assert!(result.is_err());
        prop_assert!(cart.is_empty());
        prop_assert!(cart.totals().subtotal.is_zero());
    }

    /// 数量を0以下に設定すると明細が削除される
    #[test]
    fn test_set_quantity_non_positive_removes_line(initial in 1u32..10, new_quantity in -5i64..=0) {
        let inventory = Inventory::new(CardId::new(), 10, Money::eur(Decimal::new(999, 2)));
        let mut cart = empty_cart();
        cart.add_or_increment(&inventory, initial).unwrap();

        cart.set_quantity(&inventory, new_quantity).unwrap();

        prop_assert!(cart.is_empty());
        prop_assert!(cart.totals().subtotal.is_zero());
    }

    /// 支払い確定で返される予約は明細と1対1に対応する
    #[test]
    fn test_payment_reserves_every_line(quantities in prop::collection::vec(1u32..4, 1..5)) {
        let mut cart = empty_cart();
        for quantity in &quantities {
            let inventory = Inventory::new(CardId::new(), 10, Money::eur(Decimal::new(1500, 2)));
            cart.add_or_increment(&inventory, *quantity).unwrap();
        }
        cart.checkout(valid_shipping(), PaymentMethod::Card).unwrap();

        let reservations = cart.confirm_payment(Utc::now(), "CARD-TEST".to_string()).unwrap();

        prop_assert_eq!(cart.status(), OrderStatus::Paid);
        prop_assert_eq!(reservations.len(), quantities.len());
        for (movement, line) in reservations.iter().zip(cart.line_items()) {
            prop_assert_eq!(*movement, StockMovement::reserve(line.card_id(), line.quantity()));
        }
    }
}

// Inventory のプロパティベーステスト
proptest! {
    /// 予約と解放は可逆的である
    #[test]
    fn test_inventory_reserve_release_reversible(available in 1u32..1000, quantity in 1u32..1000) {
        prop_assume!(quantity <= available);
        let mut inventory = Inventory::new(CardId::new(), available, Money::zero());

        inventory.reserve(quantity).unwrap();
        inventory.release(quantity);

        prop_assert_eq!(inventory.reserved_quantity(), 0);
        prop_assert_eq!(inventory.sellable_quantity(), available);
    }

    /// どのような操作の列でも 0 ≤ 予約数 ≤ 在庫数 が保たれる
    #[test]
    fn test_inventory_reserved_never_exceeds_available(
        available in 0u32..50,
        ops in prop::collection::vec((0u8..3, 0u32..20), 0..30),
    ) {
        let card_id = CardId::new();
        let mut inventory = Inventory::new(card_id, available, Money::zero());

        for (op, quantity) in ops {
            let movement = match op {
                0 => StockMovement::reserve(card_id, quantity),
                1 => StockMovement::release(card_id, quantity),
                _ => StockMovement::fulfil(card_id, quantity),
            };
            let before = inventory.clone();
            if inventory.apply(&movement).is_err() {
                // 拒否された操作は何も変更しない
                prop_assert_eq!(inventory.available_quantity(), before.available_quantity());
                prop_assert_eq!(inventory.reserved_quantity(), before.reserved_quantity());
            }
            prop_assert!(inventory.reserved_quantity() <= inventory.available_quantity());
        }
    }

    /// 販売確定は在庫数と予約数を同じだけ減らし、販売数を増やす
    #[test]
    fn test_inventory_fulfil_converts_reservation(available in 1u32..100, quantity in 1u32..100) {
        prop_assume!(quantity <= available);
        let mut inventory = Inventory::new(CardId::new(), available, Money::zero());
        inventory.reserve(quantity).unwrap();

        inventory.fulfil(quantity).unwrap();

        prop_assert_eq!(inventory.available_quantity(), available - quantity);
        prop_assert_eq!(inventory.reserved_quantity(), 0);
        prop_assert_eq!(inventory.units_sold(), quantity);
    }
}

fn valid_shipping() -> ShippingDetails {
    ShippingDetails::new(ShippingDetailsInput {
        full_name: "Lucía Martín".to_string(),
        email: "lucia@example.es".to_string(),
        phone: "611222333".to_string(),
        address: "Gran Vía 10".to_string(),
        city: "Madrid".to_string(),
        province: "Madrid".to_string(),
        postal_code: "28013".to_string(),
        country: None,
        notes: None,
    })
    .unwrap()
}

// ShippingDetails のプロパティベーステスト
proptest! {
    /// 4〜10文字の英数字の郵便番号は受け入れられる
    #[test]
    fn test_postal_code_alphanumeric_accepted(code in "[A-Z0-9]{4,10}") {
        let input = ShippingDetailsInput {
            full_name: "Test".to_string(),
            email: "t@example.com".to_string(),
            phone: "600000000".to_string(),
            address: "Calle 1".to_string(),
            city: "Sevilla".to_string(),
            province: "Sevilla".to_string(),
            postal_code: code,
            country: None,
            notes: None,
        };
        prop_assert!(ShippingDetails::new(input).is_ok());
    }

    /// 短すぎる郵便番号は拒否される
    #[test]
    fn test_postal_code_too_short_rejected(code in "[0-9]{0,3}") {
        let input = ShippingDetailsInput {
            full_name: "Test".to_string(),
            email: "t@example.com".to_string(),
            phone: "600000000".to_string(),
            address: "Calle 1".to_string(),
            city: "Sevilla".to_string(),
            province: "Sevilla".to_string(),
            postal_code: code,
            ..Default::default()
        };
        prop_assert!(ShippingDetails::new(input).is_err());
    }
}
