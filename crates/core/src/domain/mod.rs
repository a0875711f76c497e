pub mod contract;
pub mod market;
pub mod product;
pub mod profile;
pub mod recommendation;
