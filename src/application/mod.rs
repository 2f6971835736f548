pub mod callback;
pub mod checkout;
