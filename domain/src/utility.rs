use crate::domain::Offer;

/// This agent's own valuation of offers. Implementations must be pure:
/// the same offer always maps to the same utility in `[0, 1]`.
pub trait UtilityFunction {
    fn utility(&self, offer: &Offer) -> f64;
}

impl<F> UtilityFunction for F
where
    F: Fn(&Offer) -> f64,
{
    fn utility(&self, offer: &Offer) -> f64 {
        self(offer)
    }
}
