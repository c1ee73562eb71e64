//! Modelo de Brand
//!
//! Marca de vehículos, normalizada en su propia tabla. Se crea
//! automáticamente la primera vez que un vehículo la referencia.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Brand {
    pub id: Option<Uuid>,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    pub fn new(name: String) -> Result<Self, AppError> {
        let now = Utc::now();
        let brand = Self {
            id: None,
            name,
            created_at: now,
            updated_at: now,
        };
        brand.validate()?;
        Ok(brand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand() {
        let brand = Brand::new("Test Brand".to_string()).unwrap();
        assert_eq!(brand.id, None);
        assert_eq!(brand.name, "Test Brand");
    }

    #[test]
    fn test_brand_invalid_name() {
        let result = Brand::new("".to_string());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_brand_max_length() {
        let result = Brand::new("test".repeat(100));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_brand_equality() {
        let brand1 = Brand::new("Test Brand".to_string()).unwrap();
        let brand2 = Brand {
            created_at: brand1.created_at,
            updated_at: brand1.updated_at,
            ..brand1.clone()
        };
        assert_eq!(brand1, brand2);
    }

    #[test]
    fn test_brand_inequality() {
        let brand1 = Brand::new("Test Brand".to_string()).unwrap();
        let brand2 = Brand::new("Another Brand".to_string()).unwrap();
        assert_ne!(brand1, brand2);
    }
}
