use serde_json::json;
use uuid::Uuid;

use crate::middleware::error_handling::{AppError, Result};
use crate::models::inquiry::{
    estimate_total, CreateInquiryRequest, InquiryAggregate, InquiryStatus,
};
use crate::repositories::{InquiryFilter, InquiryStore};
use crate::services::audit_service::{AuditEvent, AuditLogger};
use crate::services::inquiry_validator::validate_create_inquiry;

/// Orchestrates the inquiry lifecycle: validation, the status state machine,
/// aggregate computations and persistence through the [`InquiryStore`] port.
pub struct InquiryService<S: InquiryStore> {
    store: S,
    audit: AuditLogger,
}

impl<S: InquiryStore> InquiryService<S> {
    pub fn new(store: S, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    /// Validates the request, persists the aggregate atomically and emits an
    /// audit event. Invalid requests fail with every violated rule collected
    /// and nothing persisted.
    pub async fn create_inquiry(
        &self,
        user_id: Uuid,
        request: CreateInquiryRequest,
    ) -> Result<InquiryAggregate> {
        let report = validate_create_inquiry(&request);
        if !report.is_valid {
            return Err(AppError::Validation(report.errors));
        }

        let total_estimated_amount = estimate_total(&request.items);
        let aggregate = self.store.insert(user_id, &request, total_estimated_amount).await?;

        self.audit.record(AuditEvent {
            actor_id: user_id,
            action: "inquiry_created",
            entity_id: aggregate.inquiry.id,
            detail: json!({
                "customer_email": aggregate.inquiry.customer_email,
                "item_count": aggregate.items.len(),
                "total_estimated_amount": total_estimated_amount,
            }),
        });

        Ok(aggregate)
    }

    /// Applies a status change after checking the state machine. Illegal
    /// transitions are rejected before any write occurs.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: InquiryStatus,
        actor_id: Uuid,
    ) -> Result<InquiryAggregate> {
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;

        let from = current.inquiry.status;
        if !from.can_transition_to(new_status) {
            return Err(AppError::Validation(vec![format!(
                "illegal status transition: {} -> {}",
                from, new_status
            )]));
        }

        let updated = self
            .store
            .update_status(id, new_status)
            .await?
            .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;

        self.audit.record(AuditEvent {
            actor_id,
            action: "inquiry_status_changed",
            entity_id: id,
            detail: json!({
                "from": from,
                "to": new_status,
            }),
        });

        Ok(updated)
    }

    pub async fn get_inquiry(&self, id: Uuid) -> Result<InquiryAggregate> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))
    }

    /// The caller's own inquiries plus the total matching count.
    pub async fn get_user_inquiries(
        &self,
        user_id: Uuid,
        mut filter: InquiryFilter,
    ) -> Result<(Vec<InquiryAggregate>, i64)> {
        filter.user_id = Some(user_id);
        self.get_all_inquiries(filter).await
    }

    pub async fn get_all_inquiries(
        &self,
        filter: InquiryFilter,
    ) -> Result<(Vec<InquiryAggregate>, i64)> {
        let total = self.store.count(&filter).await?;
        let inquiries = self.store.list(&filter).await?;
        Ok((inquiries, total))
    }
}
