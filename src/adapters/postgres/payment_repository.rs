//! PostgreSQL implementation of PaymentRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentRecordId, Timestamp, UserId,
};
use crate::domain::fulfillment::{Payment, PaymentStatus};
use crate::ports::PaymentRepository;

/// PostgreSQL implementation of the PaymentRepository port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
/// The `payments_provider_payment_id_key` unique constraint is load-bearing:
/// it is what makes one row per provider payment id a hard guarantee.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    provider_payment_id: String,
    provider_order_id: String,
    amount_minor: i64,
    currency: String,
    status: String,
    email_sent: bool,
    invite_link: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = parse_status(&row.status)?;

        Ok(Payment {
            id: PaymentRecordId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            provider_payment_id: row.provider_payment_id,
            provider_order_id: row.provider_order_id,
            amount_minor: row.amount_minor,
            currency: row.currency,
            status,
            email_sent: row.email_sent,
            invite_link: row.invite_link,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s {
        "processing" => Ok(PaymentStatus::Processing),
        "completed" => Ok(PaymentStatus::Completed),
        "failed" => Ok(PaymentStatus::Failed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

const SELECT_COLUMNS: &str = "id, user_id, provider_payment_id, provider_order_id, \
     amount_minor, currency, status, email_sent, invite_link, created_at, updated_at";

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, provider_payment_id, provider_order_id,
                amount_minor, currency, status, email_sent, invite_link,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(&payment.provider_payment_id)
        .bind(&payment.provider_order_id)
        .bind(payment.amount_minor)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(payment.email_sent)
        .bind(&payment.invite_link)
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("payments_provider_payment_id_key") {
                    // Callers insert while holding the processing lock, so a
                    // duplicate here is a bug, not a race to tolerate.
                    return DomainError::new(
                        ErrorCode::DatabaseError,
                        "payment row already exists for this provider payment id",
                    );
                }
            }
            DomainError::database(format!("Failed to insert payment: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_provider_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE provider_payment_id = $1",
            SELECT_COLUMNS
        ))
        .bind(provider_payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn mark_processing(&self, provider_payment_id: &str) -> Result<(), DomainError> {
        // Status is monotonic except failed -> processing; the guard keeps a
        // completed row untouchable even if a caller slips past its checks.
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'processing', updated_at = now()
            WHERE provider_payment_id = $1 AND status <> 'completed'
            "#,
        )
        .bind(provider_payment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark payment processing: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                "payment missing or already completed",
            ));
        }
        Ok(())
    }

    async fn mark_failed(&self, provider_payment_id: &str) -> Result<(), DomainError> {
        // Never downgrade after a confirmed send: a row with email_sent can
        // not become failed, because a later retry would re-send.
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'failed', updated_at = now()
            WHERE provider_payment_id = $1
              AND status <> 'completed'
              AND email_sent = false
            "#,
        )
        .bind(provider_payment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark payment failed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                "payment missing, completed, or already sent",
            ));
        }
        Ok(())
    }

    async fn mark_completed(
        &self,
        provider_payment_id: &str,
        invite_link: &str,
    ) -> Result<(), DomainError> {
        // Status and email_sent move together in one statement; a reader can
        // never observe email_sent = true with a non-completed status.
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'completed', email_sent = true, invite_link = $2,
                updated_at = now()
            WHERE provider_payment_id = $1 AND status <> 'completed'
            "#,
        )
        .bind(provider_payment_id)
        .bind(invite_link)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark payment completed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                "payment missing or already completed",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_works_for_all_values() {
        assert_eq!(parse_status("processing").unwrap(), PaymentStatus::Processing);
        assert_eq!(parse_status("completed").unwrap(), PaymentStatus::Completed);
        assert_eq!(parse_status("failed").unwrap(), PaymentStatus::Failed);
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("invalid").is_err());
        assert!(parse_status("").is_err());
        assert!(parse_status("Processing").is_err());
    }

    #[test]
    fn roundtrip_status_conversion() {
        for status in [
            PaymentStatus::Processing,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn row_conversion_preserves_fields() {
        let now = Utc::now();
        let row = PaymentRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider_payment_id: "pay_123".to_string(),
            provider_order_id: "order_456".to_string(),
            amount_minor: 499900,
            currency: "INR".to_string(),
            status: "completed".to_string(),
            email_sent: true,
            invite_link: Some("https://t.me/+abc".to_string()),
            created_at: now,
            updated_at: now,
        };

        let payment = Payment::try_from(row).unwrap();
        assert_eq!(payment.provider_payment_id, "pay_123");
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.email_sent);
        assert_eq!(payment.amount_minor, 499900);
    }

    #[test]
    fn row_conversion_rejects_unknown_status() {
        let now = Utc::now();
        let row = PaymentRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider_payment_id: "pay_123".to_string(),
            provider_order_id: "order_456".to_string(),
            amount_minor: 0,
            currency: "INR".to_string(),
            status: "refunded".to_string(),
            email_sent: false,
            invite_link: None,
            created_at: now,
            updated_at: now,
        };

        assert!(Payment::try_from(row).is_err());
    }
}
