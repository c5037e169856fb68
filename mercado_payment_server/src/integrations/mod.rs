pub mod mercado;
