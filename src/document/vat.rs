use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::{self, Display, Formatter};

/// VAT code of a record, derived from the ratio between the amount payable and the base amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VatCode {
    Code(u8),
    /// The ratio doesn't match any known rate. Needs manual attention.
    Undetermined,
}

impl VatCode {
    pub fn derive(amount_payable: Decimal, base_amount: Decimal) -> Self {
        if base_amount.is_zero() {
            return VatCode::Code(0);
        }
        let Some(ratio) = amount_payable.checked_div(base_amount) else {
            return VatCode::Undetermined;
        };
        // Midpoints round away from zero, as on an invoice
        match ratio.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero) {
            r if r == Decimal::new(100, 2) => VatCode::Code(5),
            r if r == Decimal::new(106, 2) => VatCode::Code(2),
            r if r == Decimal::new(112, 2) => VatCode::Code(3),
            r if r == Decimal::new(121, 2) => VatCode::Code(4),
            _ => VatCode::Undetermined,
        }
    }
}

impl Display for VatCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VatCode::Code(code) => write!(f, "{code}"),
            VatCode::Undetermined => write!(f, "FOUT"),
        }
    }
}
