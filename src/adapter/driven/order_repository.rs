use crate::adapter::database_error::{fetch_failed, DatabaseError};
use crate::domain::model::{
    CardId, CustomerId, LineItem, Money, Order, OrderId, OrderParts, OrderStatus, PaymentMethod,
    ShippingDetails, ShippingDetailsInput,
};
use crate::domain::port::{OrderRepository, RepositoryError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};
use std::collections::HashMap;

/// 注文と明細をまとめて取得するSELECT句
/// 明細のない注文（空のカート）も取得できるようLEFT JOINする
const ORDER_SELECT: &str = r#"
    SELECT
        o.id, o.customer_id, o.status,
        o.full_name, o.email, o.phone, o.address, o.city, o.province,
        o.postal_code, o.country, o.notes,
        o.payment_method, o.transaction_ref, o.discount,
        o.created_at, o.paid_at, o.shipped_at, o.delivered_at,
        ol.card_id, ol.quantity, ol.unit_price
    FROM orders o
    LEFT JOIN order_lines ol ON o.id = ol.order_id
"#;

/// MySQL注文リポジトリ
/// 注文（カートを含む）と明細を永続化する
pub struct MySqlOrderRepository {
    pool: Pool<MySql>,
}

impl MySqlOrderRepository {
    /// 新しいMySQL注文リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// JOINされた行から注文を再構築する
    /// 行の並び順（注文の順序と明細の位置）を保つ
    fn build_orders_from_rows(rows: &[MySqlRow]) -> Result<Vec<Order>, RepositoryError> {
        let mut order_index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<&MySqlRow>> = Vec::new();
        for row in rows {
            let order_id: String = row.get("id");
            let index = *order_index.entry(order_id).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[index].push(row);
        }

        groups
            .into_iter()
            .map(|group| Self::build_order(&group))
            .collect()
    }

    fn build_order(rows: &[&MySqlRow]) -> Result<Order, RepositoryError> {
        let first_row = rows
            .first()
            .ok_or_else(|| RepositoryError::FetchFailed("注文の行がありません".to_string()))?;

        let id = OrderId::from_string(first_row.get("id")).map_err(|e| fetch_failed("注文ID", e))?;
        let customer_id = CustomerId::from_string(first_row.get("customer_id"))
            .map_err(|e| fetch_failed("顧客ID", e))?;
        let status = OrderStatus::from_string(first_row.get("status"))
            .map_err(|e| fetch_failed("注文ステータス", e))?;
        let payment_method = first_row
            .get::<Option<String>, _>("payment_method")
            .map(|method| PaymentMethod::from_string(&method))
            .transpose()
            .map_err(|e| fetch_failed("支払い方法", e))?;

        let mut line_items = Vec::new();
        for row in rows {
            if let (Some(card_id), Some(quantity), Some(unit_price)) = (
                row.get::<Option<String>, _>("card_id"),
                row.get::<Option<u32>, _>("quantity"),
                row.get::<Option<Decimal>, _>("unit_price"),
            ) {
                let card_id = CardId::from_string(&card_id).map_err(|e| fetch_failed("カードID", e))?;
                let line = LineItem::new(card_id, quantity, Money::eur(unit_price))
                    .map_err(|e| fetch_failed("注文明細", e))?;
                line_items.push(line);
            }
        }

        Order::reconstruct(OrderParts {
            id,
            customer_id,
            status,
            line_items,
            shipping: Self::shipping_from_row(first_row)?,
            payment_method,
            transaction_ref: first_row.get("transaction_ref"),
            discount: Money::eur(first_row.get("discount")),
            created_at: first_row.get("created_at"),
            paid_at: first_row.get("paid_at"),
            shipped_at: first_row.get("shipped_at"),
            delivered_at: first_row.get("delivered_at"),
        })
        .map_err(|e| fetch_failed("注文集約", e))
    }

    /// 配送先は氏名が保存されている場合のみ存在する
    fn shipping_from_row(row: &MySqlRow) -> Result<Option<ShippingDetails>, RepositoryError> {
        let Some(full_name) = row.get::<Option<String>, _>("full_name") else {
            return Ok(None);
        };
        let text = |column: &str| row.get::<Option<String>, _>(column).unwrap_or_default();
        ShippingDetails::new(ShippingDetailsInput {
            full_name,
            email: text("email"),
            phone: text("phone"),
            address: text("address"),
            city: text("city"),
            province: text("province"),
            postal_code: text("postal_code"),
            country: row.get("country"),
            notes: row.get("notes"),
        })
        .map(Some)
        .map_err(|e| fetch_failed("配送先", e))
    }

    async fn fetch_orders(
        &self,
        query: sqlx::query::Query<'_, MySql, sqlx::mysql::MySqlArguments>,
        context: &str,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(context, e))?;
        Self::build_orders_from_rows(&rows)
    }
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::from_sqlx("トランザクション開始に失敗しました", e))?;

        let shipping = order.shipping();
        let totals = order.totals();
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_id, status,
                full_name, email, phone, address, city, province, postal_code, country, notes,
                payment_method, transaction_ref,
                subtotal, shipping_cost, tax, discount, total,
                created_at, paid_at, shipped_at, delivered_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status),
                full_name = VALUES(full_name),
                email = VALUES(email),
                phone = VALUES(phone),
                address = VALUES(address),
                city = VALUES(city),
                province = VALUES(province),
                postal_code = VALUES(postal_code),
                country = VALUES(country),
                notes = VALUES(notes),
                payment_method = VALUES(payment_method),
                transaction_ref = VALUES(transaction_ref),
                subtotal = VALUES(subtotal),
                shipping_cost = VALUES(shipping_cost),
                tax = VALUES(tax),
                discount = VALUES(discount),
                total = VALUES(total),
                paid_at = VALUES(paid_at),
                shipped_at = VALUES(shipped_at),
                delivered_at = VALUES(delivered_at)
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.customer_id().to_string())
        .bind(order.status().to_string())
        .bind(shipping.map(|s| s.full_name()))
        .bind(shipping.map(|s| s.email()))
        .bind(shipping.map(|s| s.phone()))
        .bind(shipping.map(|s| s.address()))
        .bind(shipping.map(|s| s.city()))
        .bind(shipping.map(|s| s.province()))
        .bind(shipping.map(|s| s.postal_code()))
        .bind(shipping.map(|s| s.country()))
        .bind(shipping.and_then(|s| s.notes()))
        .bind(order.payment_method().map(|m| m.as_str()))
        .bind(order.transaction_ref())
        .bind(totals.subtotal.amount())
        .bind(totals.shipping_cost.amount())
        .bind(totals.tax.amount())
        .bind(totals.discount.amount())
        .bind(totals.total.amount())
        .bind(order.created_at())
        .bind(order.paid_at())
        .bind(order.shipped_at())
        .bind(order.delivered_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("注文の保存に失敗しました", e))?;

        // 明細は置き換える
        sqlx::query("DELETE FROM order_lines WHERE order_id = ?")
            .bind(order.id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("注文明細の削除に失敗しました", e))?;

        for (position, line) in order.line_items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, card_id, quantity, unit_price, subtotal, position)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(order.id().to_string())
            .bind(line.card_id().to_string())
            .bind(line.quantity())
            .bind(line.unit_price().amount())
            .bind(line.subtotal().amount())
            .bind(position as u32)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("注文明細の保存に失敗しました", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx("トランザクションのコミットに失敗しました", e))?;

        Ok(())
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("{} WHERE o.id = ? ORDER BY ol.position ASC", ORDER_SELECT);
        let orders = self
            .fetch_orders(
                sqlx::query(&sql).bind(order_id.to_string()),
                "注文の取得に失敗しました",
            )
            .await?;
        Ok(orders.into_iter().next())
    }

    async fn find_cart(&self, customer_id: CustomerId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "{} WHERE o.cart_owner = ? ORDER BY ol.position ASC",
            ORDER_SELECT
        );
        let orders = self
            .fetch_orders(
                sqlx::query(&sql).bind(customer_id.to_string()),
                "カートの取得に失敗しました",
            )
            .await?;
        Ok(orders.into_iter().next())
    }

    async fn insert_cart(&self, cart: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, subtotal, shipping_cost, tax, discount, total, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(cart.id().to_string())
        .bind(cart.customer_id().to_string())
        .bind(cart.status().to_string())
        .bind(cart.totals().subtotal.amount())
        .bind(cart.totals().shipping_cost.amount())
        .bind(cart.totals().tax.amount())
        .bind(cart.totals().discount.amount())
        .bind(cart.totals().total.amount())
        .bind(cart.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("カートの作成に失敗しました", e))?;
        Ok(())
    }

    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "{} WHERE o.customer_id = ? AND o.status <> 'CART' ORDER BY o.created_at DESC, o.id, ol.position",
            ORDER_SELECT
        );
        self.fetch_orders(
            sqlx::query(&sql).bind(customer_id.to_string()),
            "注文履歴の取得に失敗しました",
        )
        .await
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "{} WHERE o.status <> 'CART' ORDER BY o.created_at DESC, o.id, ol.position",
            ORDER_SELECT
        );
        self.fetch_orders(sqlx::query(&sql), "注文一覧の取得に失敗しました")
            .await
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "{} WHERE o.status = ? ORDER BY o.created_at DESC, o.id, ol.position",
            ORDER_SELECT
        );
        self.fetch_orders(
            sqlx::query(&sql).bind(status.to_string()),
            "ステータス別注文一覧の取得に失敗しました",
        )
        .await
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}
