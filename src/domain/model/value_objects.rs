use crate::domain::error::DomainError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// UUIDをラップした識別子型を定義する
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// 新しい一意の識別子を生成
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// UUIDから作成
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// 文字列から作成
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                let uuid = Uuid::parse_str(s)?;
                Ok(Self(uuid))
            }

            /// 内部のUUIDを取得
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

entity_id!(
    /// 注文（カートを含む）の一意識別子。顧客に見せる注文番号を兼ねる
    OrderId
);
entity_id!(
    /// カードの一意識別子
    CardId
);
entity_id!(
    /// 顧客の一意識別子
    CustomerId
);
entity_id!(
    /// カテゴリの一意識別子
    CategoryId
);
entity_id!(
    /// エキスパンションの一意識別子
    ExpansionId
);
entity_id!(
    /// レビューの一意識別子
    ReviewId
);
entity_id!(
    /// コレクションの一意識別子
    CollectionId
);

/// 金額を小数第2位で四捨五入する（0.5は0から遠い方へ丸める）
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// 金額を表す値オブジェクト
/// 通貨はユーロ固定
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// 通貨コード
    pub const CURRENCY: &'static str = "EUR";

    /// ユーロの金額を作成
    pub fn eur(amount: Decimal) -> Self {
        Self(amount)
    }

    /// 0ユーロ
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// 負でない金額のみ受け付ける（価格などの入力用）
    pub fn non_negative(amount: Decimal) -> Result<Self, DomainError> {
        if amount < Decimal::ZERO {
            return Err(DomainError::InvalidValue(format!(
                "金額は負にできません: {}",
                amount
            )));
        }
        Ok(Self(amount))
    }

    /// 金額を取得
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// 通貨を文字列として取得
    pub fn currency(&self) -> String {
        Self::CURRENCY.to_string()
    }

    /// 金額を加算
    pub fn add(&self, other: &Money) -> Money {
        Money(self.0 + other.0)
    }

    /// 金額を減算
    pub fn subtract(&self, other: &Money) -> Money {
        Money(self.0 - other.0)
    }

    /// 金額を乗算
    pub fn multiply(&self, factor: u32) -> Money {
        Money(self.0 * Decimal::from(factor))
    }

    /// 小数第2位に丸める
    pub fn rounded(&self) -> Money {
        Money(round_half_up(self.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, Self::CURRENCY)
    }
}

/// 支払い方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// クレジットカード
    Card,
    /// PayPal
    PayPal,
    /// 銀行振込
    BankTransfer,
    /// 代金引換
    Cash,
}

impl PaymentMethod {
    /// 永続化・API用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::PayPal => "PAYPAL",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Cash => "CASH",
        }
    }

    /// 文字列からPaymentMethodを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "CARD" => Ok(PaymentMethod::Card),
            "PAYPAL" => Ok(PaymentMethod::PayPal),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "CASH" => Ok(PaymentMethod::Cash),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な支払い方法: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 配送先・連絡先を表す値オブジェクト
/// カート状態を抜ける時点で必須になる
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingDetails {
    full_name: String,
    email: String,
    phone: String,
    address: String,
    city: String,
    province: String,
    postal_code: String,
    country: String,
    notes: Option<String>,
}

/// 国が未指定の場合の既定値
pub const DEFAULT_COUNTRY: &str = "España";

/// ShippingDetails::new の入力
#[derive(Debug, Clone, Default)]
pub struct ShippingDetailsInput {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: Option<String>,
    pub notes: Option<String>,
}

impl ShippingDetails {
    /// 新しい配送先を作成
    /// バリデーション:
    /// - 氏名、電話番号、住所、県は空でない
    /// - メールアドレスは `local@domain` 形式
    /// - 郵便番号は4〜10文字の英数字
    pub fn new(input: ShippingDetailsInput) -> Result<Self, DomainError> {
        let required = [
            ("full_name", &input.full_name),
            ("phone", &input.phone),
            ("address", &input.address),
            ("province", &input.province),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!("{}は空にできません", field)));
            }
        }

        if !Self::is_valid_email(&input.email) {
            return Err(DomainError::Validation(format!(
                "無効なメールアドレス: {}",
                input.email
            )));
        }

        if !Self::is_valid_postal_code(&input.postal_code) {
            return Err(DomainError::Validation(
                "郵便番号は4〜10文字の英数字である必要があります".to_string(),
            ));
        }

        let country = input
            .country
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

        Ok(Self {
            full_name: input.full_name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.trim().to_string(),
            address: input.address.trim().to_string(),
            city: input.city.trim().to_string(),
            province: input.province.trim().to_string(),
            postal_code: input.postal_code.trim().to_string(),
            country,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
        })
    }

    fn is_valid_email(email: &str) -> bool {
        match email.trim().split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            }
            None => false,
        }
    }

    fn is_valid_postal_code(postal_code: &str) -> bool {
        let code = postal_code.trim();
        (4..=10).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric())
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn province(&self) -> &str {
        &self.province
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// 注文のステータス
/// CART → PENDING → PAID → SHIPPED → DELIVERED、CANCELLEDはCART/PENDING/PAIDから遷移可能
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// カート（初期状態、編集可能）
    Cart,
    /// チェックアウト済み、支払い待ち
    Pending,
    /// 支払い済み（在庫予約済み）
    Paid,
    /// 発送済み
    Shipped,
    /// 配達完了
    Delivered,
    /// キャンセル済み
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            OrderStatus::Cart => "CART",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", status_str)
    }
}

impl OrderStatus {
    /// 文字列からOrderStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "CART" => Ok(OrderStatus::Cart),
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な注文ステータス: {}",
                s
            ))),
        }
    }

    /// 終端状態かどうか
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// この状態の注文が在庫予約を保持しているか
    pub fn holds_reservation(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Shipped)
    }

    /// `next` への遷移が許可されているか
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (*self, next),
            (Cart, Pending)
                | (Pending, Paid)
                | (Paid, Shipped)
                | (Shipped, Delivered)
                | (Cart, Cancelled)
                | (Pending, Cancelled)
                | (Paid, Cancelled)
        )
    }
}
