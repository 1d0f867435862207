pub mod analysis;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub trait Entity {
    fn ident(&self) -> Uuid;
    fn created(&self) -> DateTime<Utc>;
}

/// Data used to restore a entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityData {
    pub(in crate::domain) id: Uuid,
    pub(in crate::domain) created: DateTime<Utc>,
}

impl EntityData {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created: Utc::now(),
        }
    }

    pub fn restore(id: Uuid, created: DateTime<Utc>) -> Self {
        Self { id, created }
    }
}

impl Default for EntityData {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_entity {
    ($entity:ty) => {
        impl crate::domain::entity::Entity for $entity {
            fn ident(&self) -> uuid::Uuid {
                self.data.id
            }

            fn created(&self) -> chrono::DateTime<chrono::Utc> {
                self.data.created
            }
        }
    };
}

macro_rules! state_ref {
    ($prop:ident, $rtrn:ty) => {
        pub fn $prop(&self) -> &$rtrn {
            &self.state.$prop
        }
    };
}

pub(self) use impl_entity;
pub(self) use state_ref;
