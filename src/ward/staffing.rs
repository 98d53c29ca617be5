use std::{fmt, str::FromStr};

use log::warn;
use serde::Serialize;

use crate::{
    db::{keys, PageStorage},
    error::{CareError, CareResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StaffType {
    Doctors,
    Nurses,
    Admins,
}

impl StaffType {
    pub const ALL: [StaffType; 3] = [StaffType::Doctors, StaffType::Nurses, StaffType::Admins];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffType::Doctors => "doctors",
            StaffType::Nurses => "nurses",
            StaffType::Admins => "admins",
        }
    }

    pub fn default_count(&self) -> u32 {
        match self {
            StaffType::Doctors => 12,
            StaffType::Nurses => 35,
            StaffType::Admins => 8,
        }
    }
}

impl fmt::Display for StaffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffType {
    type Err = CareError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "doctors" | "doctor" => Ok(StaffType::Doctors),
            "nurses" | "nurse" => Ok(StaffType::Nurses),
            "admins" | "admin" => Ok(StaffType::Admins),
            other => Err(CareError::validation(format!("Unknown staff type '{other}'."))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StaffCounts {
    pub doctors: u32,
    pub nurses: u32,
    pub admins: u32,
}

#[derive(Clone)]
pub struct StaffingBoard<S> {
    storage: S,
}

impl<S: PageStorage> StaffingBoard<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Stored headcount, or the default when unset or unparsable.
    pub async fn count(&self, staff_type: StaffType) -> CareResult<u32> {
        let key = keys::staff_count(staff_type.as_str());
        let stored = self.storage.get_item(&key).await?;
        Ok(match stored {
            None => staff_type.default_count(),
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("ignoring unparsable {key} value '{raw}'");
                staff_type.default_count()
            }),
        })
    }

    pub async fn counts(&self) -> CareResult<StaffCounts> {
        Ok(StaffCounts {
            doctors: self.count(StaffType::Doctors).await?,
            nurses: self.count(StaffType::Nurses).await?,
            admins: self.count(StaffType::Admins).await?,
        })
    }

    pub async fn set_count(&self, staff_type: StaffType, count: u32) -> CareResult<()> {
        self.storage
            .set_item(&keys::staff_count(staff_type.as_str()), count.to_string())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;

    #[tokio::test]
    async fn defaults_when_unset_or_garbage() {
        let storage = MemoryStorage::new();
        let board = StaffingBoard::new(storage.clone());
        assert_eq!(
            board.counts().await.unwrap(),
            StaffCounts {
                doctors: 12,
                nurses: 35,
                admins: 8
            }
        );

        storage
            .set_item("staff_count_nurses", "lots".into())
            .await
            .unwrap();
        assert_eq!(board.count(StaffType::Nurses).await.unwrap(), 35);
    }

    #[tokio::test]
    async fn stored_counts_override_defaults() {
        let board = StaffingBoard::new(MemoryStorage::new());
        board.set_count(StaffType::Doctors, 15).await.unwrap();
        assert_eq!(board.count(StaffType::Doctors).await.unwrap(), 15);
        assert_eq!(board.count(StaffType::Admins).await.unwrap(), 8);
    }

    #[test]
    fn parses_staff_types() {
        assert_eq!("Nurse".parse::<StaffType>().unwrap(), StaffType::Nurses);
        assert!("janitors".parse::<StaffType>().is_err());
        assert_eq!(StaffType::ALL.len(), 3);
    }
}
