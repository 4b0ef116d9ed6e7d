use nexus_engine::{Product, ProductId};

/// 5% sales tax, in basis points.
pub(crate) const TAX_RATE_BASIS_POINTS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CartLine {
    pub(crate) product_id: ProductId,
    pub(crate) name: String,
    pub(crate) unit_price_cents: u64,
    pub(crate) qty: u32,
}

impl CartLine {
    pub(crate) fn line_total_cents(&self) -> u64 {
        self.unit_price_cents.saturating_mul(u64::from(self.qty))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct CartTotals {
    pub(crate) subtotal_cents: u64,
    pub(crate) tax_cents: u64,
    pub(crate) total_cents: u64,
}

/// In-memory only; the cart is never written to disk.
#[derive(Debug, Clone, Default)]
pub(crate) struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub(crate) fn add(&mut self, product: &Product) {
        match self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            Some(line) => line.qty = line.qty.saturating_add(1),
            None => self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price_cents: product.price_cents,
                qty: 1,
            }),
        }
    }

    /// Changes a line's quantity; the line is dropped once it reaches zero.
    /// Returns `false` when no line exists for `id`.
    pub(crate) fn adjust(&mut self, id: ProductId, delta: i32) -> bool {
        let Some(index) = self.lines.iter().position(|line| line.product_id == id) else {
            return false;
        };
        let line = &mut self.lines[index];
        let next = i64::from(line.qty) + i64::from(delta);
        if next <= 0 {
            self.lines.remove(index);
        } else {
            line.qty = u32::try_from(next).unwrap_or(u32::MAX);
        }
        true
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }

    pub(crate) fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn quantities(&self) -> Vec<(ProductId, u32)> {
        self.lines
            .iter()
            .map(|line| (line.product_id, line.qty))
            .collect()
    }

    pub(crate) fn totals(&self) -> CartTotals {
        let subtotal_cents = self
            .lines
            .iter()
            .fold(0u64, |sum, line| sum.saturating_add(line.line_total_cents()));
        let tax_cents = (u128::from(subtotal_cents) * u128::from(TAX_RATE_BASIS_POINTS) + 5_000)
            / 10_000;
        let tax_cents = u64::try_from(tax_cents).unwrap_or(u64::MAX);
        CartTotals {
            subtotal_cents,
            tax_cents,
            total_cents: subtotal_cents.saturating_add(tax_cents),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64, price_cents: u64) -> Product {
        Product {
            id: ProductId(id),
            name: format!("item {id}"),
            price_cents,
            category: "Food".to_string(),
        }
    }

    #[test]
    fn adding_the_same_product_increments_its_line() {
        let mut cart = Cart::default();
        cart.add(&product(1, 1_250));
        cart.add(&product(2, 500));
        cart.add(&product(1, 1_250));

        assert_eq!(
            cart.quantities(),
            vec![(ProductId(1), 2), (ProductId(2), 1)]
        );
    }

    #[test]
    fn adjusting_to_zero_removes_the_line() {
        let mut cart = Cart::default();
        cart.add(&product(1, 1_250));
        assert!(cart.adjust(ProductId(1), 2));
        assert_eq!(cart.quantities(), vec![(ProductId(1), 3)]);

        assert!(cart.adjust(ProductId(1), -5));
        assert!(cart.is_empty());
        assert!(!cart.adjust(ProductId(1), 1));
    }

    #[test]
    fn totals_add_five_percent_tax_rounded_to_the_cent() {
        let mut cart = Cart::default();
        cart.add(&product(1, 1_250));
        cart.add(&product(2, 500));
        assert_eq!(
            cart.totals(),
            CartTotals {
                subtotal_cents: 1_750,
                tax_cents: 88,
                total_cents: 1_838,
            }
        );

        cart.clear();
        assert_eq!(cart.totals(), CartTotals::default());
    }

    #[test]
    fn totals_saturate_instead_of_overflowing_on_huge_prices() {
        let mut cart = Cart::default();
        cart.add(&product(1, 40_000_000_000_000_000));
        assert!(cart.adjust(ProductId(1), 5));

        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 240_000_000_000_000_000);
        assert_eq!(totals.tax_cents, 12_000_000_000_000_000);
        assert_eq!(totals.total_cents, 252_000_000_000_000_000);

        cart.add(&product(2, u64::MAX));
        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, u64::MAX);
        assert_eq!(totals.tax_cents, 922_337_203_685_477_581);
        assert_eq!(totals.total_cents, u64::MAX);
    }
}
