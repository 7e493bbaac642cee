pub mod customer;
pub mod metric;
