mod order_ref;

pub use order_ref::is_valid_order_ref;
