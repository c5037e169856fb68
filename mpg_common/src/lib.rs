mod money;

pub mod op;
mod secret;

pub use money::{serde_pesos, Money, MoneyConversionError, MXN_CURRENCY_CODE, MXN_CURRENCY_CODE_LOWER};
pub use secret::Secret;
