//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! que el derive de `validator` no cubre directamente.

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validar que un precio sea estrictamente positivo
pub fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        let mut error = ValidationError::new("positive_price");
        error.add_param("value".into(), &price.to_string());
        return Err(error);
    }
    Ok(())
}
