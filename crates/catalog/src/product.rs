use serde::{Deserialize, Serialize};

use kiosk_core::{CompanyId, CoreError, CoreResult, ProductId, Unit};

/// A purchasable SKU, scoped to a company. `spec.md` §3 (Product).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub company_id: CompanyId,
    pub name_internal: String,
    pub name_russian: String,
    pub name_chinese: String,
    pub package_weight: f64,
    pub units_per_box: f64,
    /// Derived: `package_weight * units_per_box`. Stored, and kept in sync by
    /// `NewProduct::validated` / `Catalog::add_product` — never computed ad
    /// hoc elsewhere so past ledger arithmetic stays defensible (`spec.md`
    /// §3, Product lifecycle).
    pub box_weight: f64,
    pub price_per_box: f64,
    pub unit: Unit,
}

/// Unvalidated input to `Catalog::add_product`.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub company_id: CompanyId,
    pub name_internal: String,
    pub name_russian: String,
    pub name_chinese: String,
    pub package_weight: f64,
    pub units_per_box: f64,
    pub price_per_box: f64,
    pub unit: Unit,
}

impl NewProduct {
    /// Validates units and positive numerics, and derives `box_weight`
    /// (`spec.md` §4.1, §9 "Units arithmetic for шт").
    pub fn validate(&self) -> CoreResult<f64> {
        if self.name_internal.trim().is_empty() {
            return Err(CoreError::validation("name_internal must not be empty"));
        }
        if self.package_weight <= 0.0 {
            return Err(CoreError::validation("package_weight must be positive"));
        }
        if self.units_per_box <= 0.0 {
            return Err(CoreError::validation("units_per_box must be positive"));
        }
        if self.price_per_box <= 0.0 {
            return Err(CoreError::validation("price_per_box must be positive"));
        }
        if matches!(self.unit, Unit::Sht) && self.package_weight != 1.0 {
            return Err(CoreError::validation(
                "шт (piece) products must have package_weight == 1 (quantity counts pieces, post-migration convention)",
            ));
        }
        Ok(self.package_weight * self.units_per_box)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NewProduct {
        NewProduct {
            company_id: CompanyId::from_raw(1),
            name_internal: "vanilla_cone".into(),
            name_russian: "Ванильный рожок".into(),
            name_chinese: "香草甜筒".into(),
            package_weight: 3.0,
            units_per_box: 8.0,
            price_per_box: 56000.0,
            unit: Unit::Kg,
        }
    }

    #[test]
    fn box_weight_is_derived() {
        let weight = base().validate().unwrap();
        assert_eq!(weight, 24.0);
    }

    #[test]
    fn sht_product_must_have_package_weight_one() {
        let mut p = base();
        p.unit = Unit::Sht;
        p.package_weight = 2.0;
        assert!(p.validate().is_err());

        p.package_weight = 1.0;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_nonpositive_numerics() {
        let mut p = base();
        p.price_per_box = 0.0;
        assert!(p.validate().is_err());
    }
}
