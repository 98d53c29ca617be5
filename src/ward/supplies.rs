use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::{
    db::{keys, PageStorage},
    error::{CareError, CareResult},
};

pub const UNKNOWN_STAFF_ID: &str = "UNKNOWN_STAFF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CylinderRequest {
    pub quantity: u32,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
}

/// Oxygen cylinder orders. Orders are logged for the supply team, not stored.
#[derive(Clone)]
pub struct SupplyDesk<S> {
    storage: S,
}

impl<S: PageStorage> SupplyDesk<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn current_admin_id(&self) -> CareResult<String> {
        let stored = self.storage.get_item(keys::CURRENT_ADMIN_ID).await?;
        Ok(stored
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_STAFF_ID.to_string()))
    }

    pub async fn set_admin_id(&self, admin_id: &str) -> CareResult<()> {
        let admin_id = admin_id.trim();
        if admin_id.is_empty() {
            return Err(CareError::validation("Staff ID cannot be empty."));
        }
        self.storage
            .set_item(keys::CURRENT_ADMIN_ID, admin_id.to_uppercase())
            .await?;
        Ok(())
    }

    pub async fn request_cylinders(&self, quantity: &str) -> CareResult<CylinderRequest> {
        let quantity = match quantity.trim().parse::<u32>() {
            Ok(quantity) if quantity > 0 => quantity,
            _ => {
                return Err(CareError::validation(
                    "Please enter a valid quantity (1 or more).",
                ))
            }
        };

        let request = CylinderRequest {
            quantity,
            requested_by: self.current_admin_id().await?,
            requested_at: Utc::now(),
        };
        info!(
            "Oxygen cylinder request: {} cylinders requested by staff ID {}",
            request.quantity, request.requested_by
        );
        Ok(request)
    }
}
